//! Membrane excitability and ligand gated receptors of the presynaptic bouton.

pub mod ion_channels;
pub mod hodgkin_huxley;
pub mod receptors;
