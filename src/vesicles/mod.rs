//! Vesicle pool short term plasticity (Tsodyks & Markram, 1997) gated by three
//! calcium binding docking sites (Bertram et al, 1996), with interchangeable
//! calcium sensors setting the fusion rate of docked vesicles.

use serde::{Deserialize, Serialize};
use crate::experiment::ExperimentConfig;
use crate::series::{heaviside, TimeSeries, Trajectories};


/// Rate at which releasable vesicles fuse given local calcium
pub trait ReleaseKinetics {
    /// Fusion rate (ms^-1) at calcium (nM), advances any internal sensor state by `dt`
    fn fusion_rate(&mut self, calcium: f64, dt: f64) -> f64;
    /// Sets internal sensor state to equilibrium at the given calcium
    fn equilibrate(&mut self, calcium: f64);
}

/// Saturating Hill function of local calcium
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HillRelease {
    /// Maximal fusion rate (ms^-1)
    pub v_max: f64,
    /// Calcium at half maximal rate (nM)
    pub k_half: f64,
    /// Hill coefficient
    pub n: f64,
}

impl Default for HillRelease {
    fn default() -> Self {
        HillRelease {
            v_max: 20.,
            k_half: 2000.,
            n: 4.,
        }
    }
}

impl ReleaseKinetics for HillRelease {
    fn fusion_rate(&mut self, calcium: f64, _: f64) -> f64 {
        let activation = calcium.max(0.).powf(self.n);

        self.v_max * activation / (activation + self.k_half.powf(self.n))
    }

    fn equilibrate(&mut self, _: f64) {}
}

/// Release gated only by the docking sites, used for astrocytic SLMVs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockingSitesRelease {
    /// Fusion rate of vesicles with every site bound (ms^-1)
    pub rate: f64,
}

impl Default for DockingSitesRelease {
    fn default() -> Self {
        DockingSitesRelease { rate: 1. }
    }
}

impl ReleaseKinetics for DockingSitesRelease {
    fn fusion_rate(&mut self, _: f64, _: f64) -> f64 {
        self.rate
    }

    fn equilibrate(&mut self, _: f64) {}
}

/// Calcium sensor with identical binding sites and cooperative unbinding,
/// `occupancy[j]` is the fraction of sensors with `j` calcium ions bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalciumSensor {
    /// Number of binding sites
    pub sites: usize,
    /// Binding rate (nM^-1 * ms^-1)
    pub k_on: f64,
    /// Unbinding rate (ms^-1)
    pub k_off: f64,
    /// Cooperativity factor applied to unbinding per bound ion
    pub cooperativity: f64,
    #[serde(skip)]
    pub occupancy: Vec<f64>,
}

impl Default for CalciumSensor {
    fn default() -> Self {
        CalciumSensor {
            sites: 5,
            k_on: 1e-4,
            k_off: 0.5,
            cooperativity: 0.25,
            occupancy: vec![],
        }
    }
}

impl CalciumSensor {
    fn binding_rate(&self, bound: usize, calcium: f64) -> f64 {
        (self.sites - bound) as f64 * self.k_on * calcium.max(0.)
    }

    fn unbinding_rate(&self, bound: usize) -> f64 {
        if bound == 0 {
            return 0.;
        }

        bound as f64 * self.k_off * self.cooperativity.powi(bound as i32 - 1)
    }

    /// Equilibrium occupancy at constant calcium from detailed balance
    pub fn equilibrate(&mut self, calcium: f64) {
        let mut occupancy = vec![1.; self.sites + 1];
        for j in 0..self.sites {
            occupancy[j + 1] = occupancy[j] * self.binding_rate(j, calcium)
                / self.unbinding_rate(j + 1);
        }

        let total: f64 = occupancy.iter().sum();
        self.occupancy = occupancy.into_iter().map(|x| x / total).collect();
    }

    /// Euler step of the master equation
    pub fn step(&mut self, calcium: f64, dt: f64) {
        if self.occupancy.len() != self.sites + 1 {
            self.equilibrate(calcium);
        }

        let mut change = vec![0.; self.sites + 1];
        for j in 0..=self.sites {
            let p = self.occupancy[j];
            if j < self.sites {
                let forward = self.binding_rate(j, calcium) * p;
                change[j] -= forward;
                change[j + 1] += forward;
            }
            if j > 0 {
                let backward = self.unbinding_rate(j) * p;
                change[j] -= backward;
                change[j - 1] += backward;
            }
        }

        self.occupancy.iter_mut()
            .zip(change)
            .for_each(|(p, dp)| *p += dt * dp);
    }

    /// Fraction of sensors with `bound` ions bound
    pub fn fraction(&self, bound: usize) -> f64 {
        self.occupancy.get(bound).copied().unwrap_or(0.)
    }
}

/// Fusion only from the fully bound state of a sequential binding sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequentialBindingRelease {
    #[serde(flatten)]
    pub sensor: CalciumSensor,
    /// Fusion rate from the fully bound state (ms^-1)
    pub gamma: f64,
}

impl Default for SequentialBindingRelease {
    fn default() -> Self {
        SequentialBindingRelease {
            sensor: CalciumSensor::default(),
            gamma: 18.,
        }
    }
}

impl ReleaseKinetics for SequentialBindingRelease {
    fn fusion_rate(&mut self, calcium: f64, dt: f64) -> f64 {
        if self.sensor.occupancy.is_empty() {
            self.sensor.equilibrate(calcium);
        }
        let rate = self.gamma * self.sensor.fraction(self.sensor.sites);
        self.sensor.step(calcium, dt);

        rate
    }

    fn equilibrate(&mut self, calcium: f64) {
        self.sensor.equilibrate(calcium);
    }
}

/// Allosteric sensor (Lou et al, 2005), every bound state may fuse with a rate
/// multiplied by `f` per bound ion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllostericRelease {
    #[serde(flatten)]
    pub sensor: CalciumSensor,
    /// Fusion rate with no ion bound (ms^-1)
    pub l_plus: f64,
    /// Increase in fusion rate per bound ion
    pub f: f64,
}

impl Default for AllostericRelease {
    fn default() -> Self {
        AllostericRelease {
            sensor: CalciumSensor::default(),
            l_plus: 6e-7,
            f: 31.3,
        }
    }
}

impl ReleaseKinetics for AllostericRelease {
    fn fusion_rate(&mut self, calcium: f64, dt: f64) -> f64 {
        if self.sensor.occupancy.is_empty() {
            self.sensor.equilibrate(calcium);
        }
        let rate = (0..=self.sensor.sites)
            .map(|j| self.l_plus * self.f.powi(j as i32) * self.sensor.fraction(j))
            .sum::<f64>();
        self.sensor.step(calcium, dt);

        rate
    }

    fn equilibrate(&mut self, calcium: f64) {
        self.sensor.equilibrate(calcium);
    }
}

/// Release kinetics chosen once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ReleaseModel {
    Hill(HillRelease),
    DockingSites(DockingSitesRelease),
    SequentialBinding(SequentialBindingRelease),
    Allosteric(AllostericRelease),
}

impl Default for ReleaseModel {
    fn default() -> Self {
        ReleaseModel::Hill(HillRelease::default())
    }
}

impl ReleaseModel {
    /// Name used in logs and file names
    pub fn name(&self) -> &'static str {
        match self {
            ReleaseModel::Hill(_) => "hill",
            ReleaseModel::DockingSites(_) => "docking_sites",
            ReleaseModel::SequentialBinding(_) => "sequential_binding",
            ReleaseModel::Allosteric(_) => "allosteric",
        }
    }
}

impl ReleaseKinetics for ReleaseModel {
    fn fusion_rate(&mut self, calcium: f64, dt: f64) -> f64 {
        match self {
            ReleaseModel::Hill(model) => model.fusion_rate(calcium, dt),
            ReleaseModel::DockingSites(model) => model.fusion_rate(calcium, dt),
            ReleaseModel::SequentialBinding(model) => model.fusion_rate(calcium, dt),
            ReleaseModel::Allosteric(model) => model.fusion_rate(calcium, dt),
        }
    }

    fn equilibrate(&mut self, calcium: f64) {
        match self {
            ReleaseModel::Hill(model) => model.equilibrate(calcium),
            ReleaseModel::DockingSites(model) => model.equilibrate(calcium),
            ReleaseModel::SequentialBinding(model) => model.equilibrate(calcium),
            ReleaseModel::Allosteric(model) => model.equilibrate(calcium),
        }
    }
}

/// Parameters of a vesicle pool and its glutamate pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VesicleParameters {
    /// Calcium association rates of the three docking sites (nM^-1 * ms^-1)
    pub k_on: [f64; 3],
    /// Calcium dissociation rates of the three docking sites (ms^-1)
    pub k_off: [f64; 3],
    /// Initial occupancy of the three docking sites
    pub sites_init: [f64; 3],
    /// Local calcium above which release is possible (nM)
    pub calcium_threshold: f64,
    /// Recovery time constant (ms)
    pub tau_rec: f64,
    /// Inactivation time constant (ms)
    pub tau_inact: f64,
    /// Number of fusogenic vesicles
    pub vesicles: f64,
    /// Glutamate inside one vesicle (mM)
    pub glutamate_per_vesicle: f64,
    /// Glutamate clearance rate (ms^-1)
    pub clearance: f64,
    /// Initial glutamate (mM)
    pub glutamate_init: f64,
    /// Depolarization above rest marking an evoked release (mV)
    pub spike_detection: f64,
}

impl Default for VesicleParameters {
    fn default() -> Self {
        VesicleParameters {
            k_on: [3.75e-6, 2.5e-6, 1.25e-5],
            k_off: [4e-4, 1e-3, 10e-3],
            sites_init: [0.4839, 0.2, 0.1111],
            calcium_threshold: 200.,
            tau_rec: 800.,
            tau_inact: 3.,
            vesicles: 2.,
            glutamate_per_vesicle: 15.,
            clearance: 10.,
            glutamate_init: 0.,
            spike_detection: 60.,
        }
    }
}

impl VesicleParameters {
    /// Astrocytic SLMVs, De Pitta et al (2009) and Malarkey & Parpura (2011)
    pub fn astrocyte_default() -> Self {
        VesicleParameters {
            sites_init: [0.48, 0.2, 5e-4],
            calcium_threshold: 196.69,
            vesicles: 12.,
            glutamate_per_vesicle: 20.,
            glutamate_init: 1e-3,
            ..VesicleParameters::default()
        }
    }
}

/// Releasable, effective and inactive vesicle fractions with the docking
/// sites and the glutamate released into the cleft
#[derive(Debug, Clone, Trajectories)]
pub struct VesiclePool {
    pub params: VesicleParameters,
    pub kinetics: ReleaseModel,
    /// Releasable fraction
    pub r: TimeSeries,
    /// Effective fraction
    pub e: TimeSeries,
    /// Inactive fraction
    pub i: TimeSeries,
    pub o1: TimeSeries,
    pub o2: TimeSeries,
    pub o3: TimeSeries,
    /// Glutamate concentration (mM)
    pub glutamate: TimeSeries,
    /// Step of the last evoked release
    pub last_evoked_release: Option<usize>,
    was_depolarized: bool,
}

impl VesiclePool {
    pub fn new(len: usize, params: VesicleParameters, mut kinetics: ReleaseModel, calcium_rest: f64) -> Self {
        kinetics.equilibrate(calcium_rest);

        VesiclePool {
            params,
            kinetics,
            r: TimeSeries::with_initial(len, 1.),
            e: TimeSeries::with_initial(len, 0.),
            i: TimeSeries::with_initial(len, 0.),
            o1: TimeSeries::with_initial(len, params.sites_init[0]),
            o2: TimeSeries::with_initial(len, params.sites_init[1]),
            o3: TimeSeries::with_initial(len, params.sites_init[2]),
            glutamate: TimeSeries::with_initial(len, params.glutamate_init),
            last_evoked_release: None,
            was_depolarized: false,
        }
    }

    /// Evoked release of the bouton, records a release event on the upward
    /// crossing of `spike_detection` above rest then advances the pool
    pub fn release(
        &mut self,
        i: usize,
        ex: &ExperimentConfig,
        voltage: f64,
        rest_voltage: f64,
        calcium: f64,
    ) -> f64 {
        let depolarized = voltage - rest_voltage >= self.params.spike_detection;
        if depolarized && !self.was_depolarized {
            self.last_evoked_release = Some(i);
        }
        self.was_depolarized = depolarized;

        self.release_step(i, ex.delta_t, calcium)
    }

    /// Advances docking sites, vesicle fractions and glutamate from `i` to
    /// `i + 1`, returns the released fraction rate at `i`, the fusion rate is
    /// capped at `1 / dt` so fractions stay in `[0, 1]`
    pub fn release_step(&mut self, i: usize, dt: f64, calcium: f64) -> f64 {
        let p = self.params;

        let fusion = self.kinetics.fusion_rate(calcium, dt);
        let docked = self.o1[i] * self.o2[i] * self.o3[i];
        let u = (heaviside(calcium - p.calcium_threshold) * docked * fusion).min(1. / dt);

        for (site, o) in [&mut self.o1, &mut self.o2, &mut self.o3].into_iter().enumerate() {
            o[i + 1] = o[i] + dt * (p.k_on[site] * calcium - o[i] * (p.k_on[site] * calcium + p.k_off[site]));
        }

        let (r, e) = (self.r[i], self.e[i]);
        self.r[i + 1] = r + dt * (self.i[i] / p.tau_rec - u * r);
        self.e[i + 1] = e + dt * (u * r - e / p.tau_inact);
        self.i[i + 1] = 1. - self.r[i + 1] - self.e[i + 1];

        self.glutamate[i + 1] = self.glutamate[i]
            + dt * (p.vesicles * p.glutamate_per_vesicle * e - p.clearance * self.glutamate[i]);

        u * r
    }

    /// Time since the last evoked release (ms) as of step `i`
    pub fn time_since_release(&self, i: usize, dt: f64) -> Option<f64> {
        self.last_evoked_release
            .filter(|release| *release <= i)
            .map(|release| (i - release) as f64 * dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::build_train;
    use crate::parameters::StimulusParameters;

    fn run_pool(kinetics: ReleaseModel, calcium: impl Fn(usize) -> f64, steps: usize) -> VesiclePool {
        let mut pool = VesiclePool::new(steps + 1, VesicleParameters::default(), kinetics, 100.);
        for i in 0..steps {
            pool.release_step(i, 0.05, calcium(i));
        }

        pool
    }

    fn models() -> Vec<ReleaseModel> {
        vec![
            ReleaseModel::Hill(HillRelease::default()),
            ReleaseModel::DockingSites(DockingSitesRelease::default()),
            ReleaseModel::SequentialBinding(SequentialBindingRelease::default()),
            ReleaseModel::Allosteric(AllostericRelease::default()),
        ]
    }

    #[test]
    fn test_no_release_below_threshold() {
        for model in models() {
            let pool = run_pool(model, |_| 150., 2000);

            assert!(pool.e.iter().all(|e| *e == 0.));
            assert!(pool.r.iter().all(|r| *r == 1.));
        }
    }

    #[test]
    fn test_fractions_conserved_and_bounded() {
        let calcium = |i: usize| if i % 1500 < 40 { 20_000. } else { 100. };

        for model in models() {
            let name = model.name();
            let pool = run_pool(model, calcium, 6000);

            for step in 0..pool.r.len() {
                let (r, e, inactive) = (pool.r[step], pool.e[step], pool.i[step]);
                assert!((r + e + inactive - 1.).abs() < 1e-12, "{}: step {}", name, step);
                for x in [r, e, inactive, pool.o1[step], pool.o2[step], pool.o3[step]] {
                    assert!((-1e-12..=1. + 1e-12).contains(&x), "{}: {} at step {}", name, x, step);
                }
                assert!(pool.glutamate[step] >= 0.);
            }
            assert!(pool.e.max_in(0, pool.e.len()).unwrap_or(0.) > 0., "{}", name);
        }
    }

    #[test]
    fn test_oversized_fusion_rate_is_capped() {
        let calcium = |i: usize| if i % 1500 < 40 { 1e6 } else { 100. };
        let model = ReleaseModel::Hill(HillRelease { v_max: 100., ..HillRelease::default() });
        let pool = run_pool(model, calcium, 3000);

        for step in 0..pool.r.len() {
            let (r, e, inactive) = (pool.r[step], pool.e[step], pool.i[step]);
            assert!((r + e + inactive - 1.).abs() < 1e-12, "step {}", step);
            for x in [r, e, inactive] {
                assert!((-1e-12..=1. + 1e-12).contains(&x), "{} at step {}", x, step);
            }
        }
        assert!(pool.e.max_in(0, pool.e.len()).unwrap_or(0.) > 0.);
    }

    #[test]
    fn test_sensor_equilibrium_is_stationary() {
        let mut sensor = CalciumSensor::default();
        sensor.equilibrate(1000.);
        let before = sensor.occupancy.clone();
        sensor.step(1000., 0.05);

        assert!((sensor.occupancy.iter().sum::<f64>() - 1.).abs() < 1e-12);
        for (a, b) in before.iter().zip(sensor.occupancy.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_release_event_on_upward_crossing() {
        let ex = build_train(75., 1., 1, 0.05, false, &StimulusParameters::default())
            .expect("valid experiment");
        let mut pool = VesiclePool::new(11, VesicleParameters::default(), ReleaseModel::default(), 100.);

        let voltages = [-70., -20., 20., 30., -60., -70., 10.];
        for (step, voltage) in voltages.iter().enumerate() {
            pool.release(step, &ex, *voltage, -70., 100.);
            if step == 2 {
                assert_eq!(pool.last_evoked_release, Some(2));
            }
        }

        assert_eq!(pool.last_evoked_release, Some(6));
        assert_eq!(pool.time_since_release(8, 0.05), Some(2. * 0.05));
    }
}
