mod common;

use common::{harness, harness_with};
use qmgmt_core::{
    DenyList, DestinationClass, Method, MgmtConfig, MgmtError, MgmtErrorKind, Presence,
    ProtocolViolation, VmClass,
};
use std::sync::Arc;

fn assert_protocol(result: qmgmt_core::MgmtResult<String>) -> ProtocolViolation {
    match result {
        Err(MgmtError::Protocol(violation)) => violation,
        other => panic!("expected a protocol violation, got {other:?}"),
    }
}

#[test]
fn dom0_only_methods_reject_guest_destination() {
    let h = harness();
    let cases = [
        ("mgmt.vmclass.List", "", ""),
        ("mgmt.vm.Create.AppVM", "", "name=test-vm2 label=red"),
        ("mgmt.label.List", "", ""),
        ("mgmt.label.Get", "red", ""),
        ("mgmt.label.Create", "cyan", "0x00ffff"),
        ("mgmt.label.Remove", "red", ""),
        ("mgmt.property.List", "", ""),
        ("mgmt.property.Get", "default_netvm", ""),
        ("mgmt.property.Set", "default_kernel", "2.0"),
        ("mgmt.pool.List", "", ""),
        ("mgmt.backup.Info", "default", ""),
    ];
    for (method, argument, payload) in cases {
        let violation = assert_protocol(h.call(method, "test-vm1", argument, payload));
        assert!(
            matches!(violation, ProtocolViolation::Dom0Only { .. }),
            "{method}: {violation:?}"
        );
        assert_eq!(h.permission_events(method), 0, "{method}");
    }
    assert_eq!(h.saves.count(), 0);
    assert!(h.backend.invocations().is_empty());
}

#[test]
fn vm_only_methods_reject_dom0_when_enforced() {
    let h = harness();
    let cases = [
        ("mgmt.vm.property.List", "", ""),
        ("mgmt.vm.property.Get", "name", ""),
        ("mgmt.vm.feature.List", "", ""),
        ("mgmt.vm.tag.Set", "tag1", ""),
        ("mgmt.vm.Remove", "", ""),
        ("mgmt.vm.Start", "", ""),
    ];
    for (method, argument, payload) in cases {
        let violation = assert_protocol(h.call(method, "dom0", argument, payload));
        assert!(
            matches!(violation, ProtocolViolation::VmOnly { .. }),
            "{method}: {violation:?}"
        );
    }
    assert!(h.events.events().is_empty());
    assert!(h.backend.invocations().is_empty());
}

#[test]
fn vm_only_methods_accept_dom0_when_not_enforced() {
    let config = MgmtConfig {
        enforce_vm_only: false,
        ..MgmtConfig::default()
    };
    let h = harness_with(config, |_| {});
    let value = h
        .call("mgmt.vm.property.Get", "dom0", "label", "")
        .expect("dom0 label");
    assert_eq!(value, "default=True type=label black");

    let value = h
        .call("mgmt.vm.property.List", "dom0", "", "")
        .expect("dom0 properties");
    assert_eq!(value, "qid\nname\nuuid\nlabel\n");
}

#[test]
fn dom0_name_cannot_move_to_another_domain() {
    let config = MgmtConfig {
        enforce_vm_only: false,
        ..MgmtConfig::default()
    };
    let h = harness_with(config, |_| {});

    let err = h
        .call("mgmt.vm.property.Set", "dom0", "name", "notdom0")
        .expect_err("dom0 name is read-only");
    assert_eq!(err.kind(), MgmtErrorKind::ValidationError);
    let err = h
        .call("mgmt.vm.property.Set", "test-vm1", "name", "dom0")
        .expect_err("guest cannot take the dom0 name");
    assert_eq!(err.kind(), MgmtErrorKind::ValidationError);
    assert_eq!(h.saves.count(), 0);

    assert_eq!(
        h.call("mgmt.vm.List", "test-vm1", "", "").expect("guest list"),
        "test-vm1 class=AppVM state=Halted\n"
    );
    assert!(h
        .call("mgmt.vm.List", "dom0", "", "")
        .expect("full list")
        .starts_with("dom0 class=AdminVM state=Running\n"));
}

#[test]
fn argument_and_payload_presence_is_checked() {
    let h = harness();
    assert_eq!(
        assert_protocol(h.call("mgmt.vm.List", "dom0", "unexpected", "")),
        ProtocolViolation::UnexpectedArgument
    );
    assert_eq!(
        assert_protocol(h.call("mgmt.vm.List", "dom0", "", "unexpected")),
        ProtocolViolation::UnexpectedPayload
    );
    assert_eq!(
        assert_protocol(h.call("mgmt.vm.property.Get", "test-vm1", "", "")),
        ProtocolViolation::MissingArgument
    );
    assert_eq!(
        assert_protocol(h.call("mgmt.vm.property.Help", "test-vm1", "label", "x")),
        ProtocolViolation::UnexpectedPayload
    );
    assert_eq!(
        assert_protocol(h.call("mgmt.label.Create", "dom0", "cyan", "")),
        ProtocolViolation::MissingPayload
    );
    assert!(h.events.events().is_empty());
}

#[test]
fn shape_is_checked_before_destination() {
    let h = harness();
    let violation = assert_protocol(h.call("mgmt.vm.List", "no-such-vm", "extra", ""));
    assert_eq!(violation, ProtocolViolation::UnexpectedArgument);
}

#[test]
fn unknown_methods_are_protocol_violations() {
    let h = harness();
    for method in [
        "mgmt.vm.NoSuchMethod",
        "mgmt.vm.Create.AdminVM",
        "mgmt.vm.Create.NoSuchClass",
        "",
    ] {
        let violation = assert_protocol(h.call(method, "dom0", "", ""));
        assert!(
            matches!(violation, ProtocolViolation::UnknownMethod(_)),
            "{method:?}: {violation:?}"
        );
    }
}

#[test]
fn non_ascii_routing_fields_are_rejected() {
    let h = harness();
    let violation = assert_protocol(h.service.execute(&qmgmt_core::MgmtCall::new(
        b"mgmt.vm.\xc3\xa9List".as_slice(),
        "dom0",
        "",
        "",
    )));
    assert_eq!(violation, ProtocolViolation::NonAscii { field: "method" });

    let violation = assert_protocol(h.call("mgmt.vm.property.Get", "test-vm1", "n\u{e4}me", ""));
    assert_eq!(violation, ProtocolViolation::NonAscii { field: "argument" });
}

#[test]
fn unknown_destination_is_not_found_without_permission_event() {
    let h = harness();
    let err = h
        .call("mgmt.vm.property.Get", "no-such-vm", "name", "")
        .expect_err("unknown destination");
    assert_eq!(err, MgmtError::not_found("domain", "no-such-vm"));
    assert!(h.events.events().is_empty());
}

#[test]
fn denied_call_mutates_nothing() {
    let mut h = harness();
    h.service
        .add_policy(Arc::new(DenyList::new(["mgmt.vm.property.Set"])));

    let err = h
        .call("mgmt.vm.property.Set", "test-vm1", "vcpus", "4")
        .expect_err("denied");
    assert_eq!(err.kind(), MgmtErrorKind::PermissionDenied);
    match &err {
        MgmtError::PermissionDenied { event, .. } => {
            assert_eq!(event, "mgmt-permission:mgmt.vm.property.Set");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(h.permission_events("mgmt.vm.property.Set"), 1);
    assert_eq!(h.events.count("mgmt:mgmt.vm.property.Set"), 0);
    assert_eq!(h.saves.count(), 0);
    assert_eq!(h.get("test-vm1", "vcpus"), "default=True type=int 2");
}

#[test]
fn successful_call_fires_permission_then_post_event() {
    let h = harness();
    h.call("mgmt.vm.property.Set", "test-vm1", "vcpus", "4")
        .expect("set vcpus");
    assert_eq!(
        h.events.events(),
        [
            "mgmt-permission:mgmt.vm.property.Set",
            "mgmt:mgmt.vm.property.Set"
        ]
    );
}

#[test]
fn failed_handler_fires_no_post_event() {
    let h = harness();
    h.call("mgmt.vm.property.Set", "test-vm1", "vcpus", "0")
        .expect_err("vcpus must be positive");
    assert_eq!(
        h.events.events(),
        ["mgmt-permission:mgmt.vm.property.Set"]
    );
    assert_eq!(h.saves.count(), 0);
}

#[test]
fn every_method_in_table_parses_back() {
    for method in Method::all() {
        assert_eq!(Method::parse(&method.name()), Ok(method));
    }
    assert!(Method::all().contains(&Method::VmCreate(VmClass::StandaloneVm)));
}

fn valid_destination(method: Method) -> &'static str {
    match method.contract().destination {
        DestinationClass::Dom0Only => "dom0",
        DestinationClass::VmOnly | DestinationClass::Any => "test-vm1",
    }
}

#[test]
fn forbidden_payload_is_rejected_for_every_method() {
    let h = harness();
    for method in Method::all() {
        let contract = method.contract();
        if contract.payload != Presence::Forbidden {
            continue;
        }
        let argument = if contract.argument == Presence::Required {
            "some-arg"
        } else {
            ""
        };
        let violation = assert_protocol(h.call(
            &method.name(),
            valid_destination(method),
            argument,
            "unexpected payload",
        ));
        assert_eq!(violation, ProtocolViolation::UnexpectedPayload, "{method}");
    }
    assert!(h.events.events().is_empty());
    assert!(h.backend.invocations().is_empty());
}

#[test]
fn forbidden_argument_is_rejected_for_every_method() {
    let h = harness();
    for method in Method::all() {
        let contract = method.contract();
        if contract.argument != Presence::Forbidden {
            continue;
        }
        let payload = if contract.payload == Presence::Required {
            "some-payload"
        } else {
            ""
        };
        let violation = assert_protocol(h.call(
            &method.name(),
            valid_destination(method),
            "unexpected-arg",
            payload,
        ));
        assert_eq!(violation, ProtocolViolation::UnexpectedArgument, "{method}");
    }
    assert!(h.events.events().is_empty());
    assert_eq!(h.saves.count(), 0);
}
