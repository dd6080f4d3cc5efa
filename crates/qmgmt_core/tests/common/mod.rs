#![allow(dead_code)]

use qmgmt_core::property::access::{set_property, PropertyTarget};
use qmgmt_core::{
    App, BackendCall, BackendError, BackendOutput, CallContext, Entity, EventObserver,
    MgmtCall, MgmtConfig, MgmtResult, MgmtService, Persistence, RunState, VmClass, VmControl,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct RecordingPersistence {
    saves: AtomicUsize,
}

impl RecordingPersistence {
    pub fn count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Persistence for RecordingPersistence {
    fn request_save(&self) {
        self.saves.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("observer lock").clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|seen| *seen == event).count()
    }
}

impl EventObserver for RecordingObserver {
    fn on_event(&self, event: &str, _context: &CallContext) {
        self.events
            .lock()
            .expect("observer lock")
            .push(event.to_string());
    }
}

/// Reports `Halted` unless told otherwise and accepts every delegated call.
#[derive(Default)]
pub struct FixedStateControl {
    states: Mutex<BTreeMap<String, RunState>>,
    invocations: Mutex<Vec<String>>,
}

impl FixedStateControl {
    pub fn set_state(&self, name: &str, state: RunState) {
        self.states
            .lock()
            .expect("state lock")
            .insert(name.to_string(), state);
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().expect("invocation lock").clone()
    }
}

impl VmControl for FixedStateControl {
    fn state(&self, entity: &Entity) -> RunState {
        self.states
            .lock()
            .expect("state lock")
            .get(entity.name())
            .copied()
            .unwrap_or(RunState::Halted)
    }

    fn invoke(&self, call: &BackendCall<'_>) -> Result<BackendOutput, BackendError> {
        let method = call.method.name().into_owned();
        self.invocations
            .lock()
            .expect("invocation lock")
            .push(format!("{method}@{}", call.destination.name()));
        if method == "mgmt.vm.Kill" {
            return Err(BackendError::Failed("domain is not running".to_string()));
        }
        Ok(BackendOutput {
            text: format!("{method} on {}", call.destination.name()),
            mutated: true,
        })
    }
}

pub struct Harness {
    pub service: MgmtService,
    pub saves: Arc<RecordingPersistence>,
    pub events: Arc<RecordingObserver>,
    pub backend: Arc<FixedStateControl>,
}

impl Harness {
    pub fn call(
        &self,
        method: &str,
        destination: &str,
        argument: &str,
        payload: impl AsRef<[u8]>,
    ) -> MgmtResult<String> {
        self.service
            .execute(&MgmtCall::new(method, destination, argument, payload))
    }

    pub fn permission_events(&self, method: &str) -> usize {
        self.events.count(&format!("mgmt-permission:{method}"))
    }

    pub fn get(&self, destination: &str, property: &str) -> String {
        self.call("mgmt.vm.property.Get", destination, property, "")
            .expect("property get")
    }
}

/// dom0, `test-template` (qid 1) and `test-vm1` (qid 2, AppVM on the
/// template), host `default_kernel` = `1.0`, no default netvm.
pub fn base_app(config: MgmtConfig) -> App {
    let mut app = App::new(config);
    set_property(&mut app, PropertyTarget::Host, "default_kernel", b"1.0").expect("kernel");
    app.add_new_vm(VmClass::TemplateVm, "test-template", "black", None)
        .expect("template");
    set_property(
        &mut app,
        PropertyTarget::Host,
        "default_template",
        b"test-template",
    )
    .expect("default template");
    app.add_new_vm(VmClass::AppVm, "test-vm1", "red", Some("test-template"))
        .expect("test-vm1");
    app
}

pub fn harness() -> Harness {
    harness_with(MgmtConfig::default(), |_| {})
}

pub fn harness_with(config: MgmtConfig, customize: impl FnOnce(&mut App)) -> Harness {
    let mut app = base_app(config);
    customize(&mut app);

    let saves = Arc::new(RecordingPersistence::default());
    let events = Arc::new(RecordingObserver::default());
    let backend = Arc::new(FixedStateControl::default());
    let mut service = MgmtService::new(app, saves.clone(), backend.clone());
    service.add_observer(events.clone());
    Harness {
        service,
        saves,
        events,
        backend,
    }
}
