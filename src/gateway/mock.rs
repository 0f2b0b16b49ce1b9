//! Scripted in-memory gateway for controller tests

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use super::{GatewayError, ResourceGateway, Role, UnitPhase, UnitStatus, WorkloadUnit};

type Key = (Role, usize);

#[derive(Default)]
struct MockState {
    units: BTreeMap<Key, WorkloadUnit>,
    created: Vec<Key>,
    history: Vec<WorkloadUnit>,
    deleted: Vec<Key>,
    delete_attempts: Vec<Key>,
    polls: HashMap<Key, usize>,
    create_failures: HashSet<Key>,
    delete_failures: HashSet<Key>,
    log_failures: HashSet<usize>,
    no_address: HashSet<usize>,
    address_after: usize,
    generator_phases: HashMap<usize, Vec<UnitPhase>>,
    logs: HashMap<usize, String>,
}

/// In-memory gateway whose behavior is scripted per unit
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the create call for one unit
    pub fn fail_create(self, role: Role, index: usize) -> Self {
        self.state.lock().unwrap().create_failures.insert((role, index));
        self
    }

    /// Fail the delete call for one unit
    pub fn fail_delete(self, role: Role, index: usize) -> Self {
        self.state.lock().unwrap().delete_failures.insert((role, index));
        self
    }

    /// Fail log retrieval for one generator
    pub fn fail_logs(self, index: usize) -> Self {
        self.state.lock().unwrap().log_failures.insert(index);
        self
    }

    /// Receivers report an address only after this many empty polls
    pub fn address_after(self, polls: usize) -> Self {
        self.state.lock().unwrap().address_after = polls;
        self
    }

    /// Receiver never gets an address
    pub fn without_address(self, index: usize) -> Self {
        self.state.lock().unwrap().no_address.insert(index);
        self
    }

    /// Phases reported by successive polls of a generator; the last repeats
    pub fn generator_phases(self, index: usize, phases: Vec<UnitPhase>) -> Self {
        self.state
            .lock()
            .unwrap()
            .generator_phases
            .insert(index, phases);
        self
    }

    pub fn logs(self, index: usize, logs: impl Into<String>) -> Self {
        self.state.lock().unwrap().logs.insert(index, logs.into());
        self
    }

    pub fn created(&self) -> Vec<Key> {
        self.state.lock().unwrap().created.clone()
    }

    /// Units actually removed, sorted
    pub fn deleted(&self) -> Vec<Key> {
        let mut deleted = self.state.lock().unwrap().deleted.clone();
        deleted.sort();
        deleted
    }

    /// Every delete call issued, sorted
    pub fn delete_attempts(&self) -> Vec<Key> {
        let mut attempts = self.state.lock().unwrap().delete_attempts.clone();
        attempts.sort();
        attempts
    }

    /// Unit as it was created, even if since deleted
    pub fn unit(&self, role: Role, index: usize) -> Option<WorkloadUnit> {
        self.state
            .lock()
            .unwrap()
            .history
            .iter()
            .find(|u| u.role == role && u.index == index)
            .cloned()
    }

    pub fn live_units(&self) -> usize {
        self.state.lock().unwrap().units.len()
    }
}

/// Build iperf3 client output with one interval line per rate plus the
/// closing summary block.
pub fn interval_log(rates: &[f64]) -> String {
    let mut out = String::from(
        "Connecting to host 10.0.0.10, port 5201\n\
         [ ID] Interval           Transfer     Bitrate         Retr  Cwnd\n",
    );
    for (i, rate) in rates.iter().enumerate() {
        out.push_str(&format!(
            "[  5]   {}.00-{}.00   sec  1.25 GBytes  {} Gbits/sec    0   3.04 MBytes       \n",
            i,
            i + 1,
            rate
        ));
    }
    out.push_str(
        "- - - - - - - - - - - - - - - - - - - - - - - - -\n\
         [ ID] Interval           Transfer     Bitrate         Retr\n\
         [  5]   0.00-10.00  sec  13.2 GBytes  11.4 Gbits/sec    0             sender\n\
         [  5]   0.00-10.00  sec  13.2 GBytes  11.4 Gbits/sec                  receiver\n\
         \n\
         iperf Done.\n",
    );
    out
}

#[async_trait]
impl ResourceGateway for MockGateway {
    async fn create(&self, unit: &WorkloadUnit) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        let key = (unit.role, unit.index);

        if state.create_failures.contains(&key) {
            return Err(GatewayError::Api {
                name: unit.name.clone(),
                code: 403,
                message: "forbidden".to_string(),
            });
        }
        if state.units.contains_key(&key) {
            return Err(GatewayError::AlreadyExists(unit.name.clone()));
        }

        state.units.insert(key, unit.clone());
        state.created.push(key);
        state.history.push(unit.clone());
        Ok(())
    }

    async fn get(&self, role: Role, index: usize) -> Result<UnitStatus, GatewayError> {
        let mut state = self.state.lock().unwrap();
        let key = (role, index);

        if !state.units.contains_key(&key) {
            return Err(GatewayError::NotFound(role.unit_name(index)));
        }

        let polls = state.polls.entry(key).or_insert(0);
        let poll = *polls;
        *polls += 1;

        match role {
            Role::Receiver => {
                let address = (poll >= state.address_after && !state.no_address.contains(&index))
                    .then(|| format!("10.0.0.{}", index + 10));
                Ok(UnitStatus::new(address, UnitPhase::Running))
            }
            Role::Generator => {
                let phase = state
                    .generator_phases
                    .get(&index)
                    .and_then(|phases| phases.get(poll).or_else(|| phases.last()))
                    .copied()
                    .unwrap_or(UnitPhase::Succeeded);
                Ok(UnitStatus::new(Some("10.0.1.1".to_string()), phase))
            }
        }
    }

    async fn get_logs(&self, role: Role, index: usize) -> Result<String, GatewayError> {
        let state = self.state.lock().unwrap();

        if !state.units.contains_key(&(role, index)) {
            return Err(GatewayError::NotFound(role.unit_name(index)));
        }
        if state.log_failures.contains(&index) {
            return Err(GatewayError::Other("log stream closed".to_string()));
        }

        Ok(state
            .logs
            .get(&index)
            .cloned()
            .unwrap_or_else(|| interval_log(&[10.0; 30])))
    }

    async fn delete(&self, role: Role, index: usize) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        let key = (role, index);
        state.delete_attempts.push(key);

        if state.delete_failures.contains(&key) {
            return Err(GatewayError::Api {
                name: role.unit_name(index),
                code: 500,
                message: "internal error".to_string(),
            });
        }
        if state.units.remove(&key).is_none() {
            return Err(GatewayError::NotFound(role.unit_name(index)));
        }

        state.deleted.push(key);
        Ok(())
    }
}
