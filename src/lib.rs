//! Calcium dependent short-term plasticity at a hippocampal presynaptic bouton,
//! optionally coupled to an astrocyte calcium oscillator.
//!
//! A run builds a stimulus train with [`experiment::build_train`], then
//! [`simulation::run_experiment`] integrates every trial under control and
//! blocker conditions and scores the per pulse release.

pub mod series;
pub mod distribution;
pub mod error;
pub mod parameters;
pub mod experiment;
pub mod neuron;
pub mod calcium;
pub mod vesicles;
pub mod bouton;
pub mod astrocyte;
pub mod simulation;
pub mod export;
