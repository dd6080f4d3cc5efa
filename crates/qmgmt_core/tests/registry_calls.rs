mod common;

use common::{harness, harness_with};
use qmgmt_core::property::access::{set_property, PropertyTarget};
use qmgmt_core::{MgmtConfig, MgmtError, MgmtErrorKind, RunState};
use std::thread;

#[test]
fn vmclass_list_names_every_class() {
    let h = harness();
    let value = h.call("mgmt.vmclass.List", "dom0", "", "").expect("classes");
    assert_eq!(value, "AdminVM\nAppVM\nStandaloneVM\nTemplateVM\n");
    assert_eq!(h.saves.count(), 0);
}

#[test]
fn create_app_vm_uses_default_template() {
    let h = harness();
    let value = h
        .call("mgmt.vm.Create.AppVM", "dom0", "", "name=test-vm2 label=red")
        .expect("create");
    assert_eq!(value, "");
    assert_eq!(h.saves.count(), 1);
    assert_eq!(
        h.get("test-vm2", "template"),
        "default=False type=vm test-template"
    );
    assert_eq!(h.get("test-vm2", "label"), "default=False type=label red");
    assert_eq!(h.get("test-vm2", "qid"), "default=False type=int 3");
    assert_eq!(h.events.count("mgmt:mgmt.vm.Create.AppVM"), 1);
}

#[test]
fn create_app_vm_with_explicit_template() {
    let h = harness();
    h.call(
        "mgmt.vm.Create.AppVM",
        "dom0",
        "test-template",
        "label=green name=test-vm2",
    )
    .expect("create");
    assert_eq!(
        h.get("test-vm2", "template"),
        "default=False type=vm test-template"
    );
}

#[test]
fn create_standalone_and_template_vms() {
    let h = harness();
    h.call(
        "mgmt.vm.Create.StandaloneVM",
        "dom0",
        "",
        "name=standalone label=blue",
    )
    .expect("standalone");
    h.call(
        "mgmt.vm.Create.TemplateVM",
        "dom0",
        "",
        "name=template2 label=black",
    )
    .expect("template");
    let listing = h.call("mgmt.vm.List", "dom0", "", "").expect("list");
    assert!(listing.contains("standalone class=StandaloneVM state=Halted\n"));
    assert!(listing.contains("template2 class=TemplateVM state=Halted\n"));
    assert_eq!(h.saves.count(), 2);
}

#[test]
fn create_rejects_invalid_requests() {
    let h = harness();
    let cases = [
        ("mgmt.vm.Create.AppVM", "", "name=test-vm1 label=red"),
        ("mgmt.vm.Create.AppVM", "", "name=test-vm2 label=no-such-label"),
        ("mgmt.vm.Create.AppVM", "", "name=bad/name label=red"),
        ("mgmt.vm.Create.AppVM", "", "name=test-vm2"),
        ("mgmt.vm.Create.AppVM", "test-vm1", "name=test-vm2 label=red"),
        ("mgmt.vm.Create.AppVM", "no-such-vm", "name=test-vm2 label=red"),
        ("mgmt.vm.Create.TemplateVM", "test-template", "name=test-vm2 label=red"),
    ];
    for (method, argument, payload) in cases {
        let err = h
            .call(method, "dom0", argument, payload)
            .expect_err("create must fail");
        assert_eq!(err.kind(), MgmtErrorKind::ValidationError, "{payload}");
    }
    assert_eq!(h.saves.count(), 0);
    let listing = h.call("mgmt.vm.List", "dom0", "", "").expect("list");
    assert_eq!(listing.lines().count(), 3);
}

#[test]
fn create_without_any_template_fails() {
    let h = harness_with(MgmtConfig::default(), |app| {
        set_property(app, PropertyTarget::Host, "default_template", b"")
            .expect("clear default template");
    });
    let err = h
        .call("mgmt.vm.Create.AppVM", "dom0", "", "name=test-vm2 label=red")
        .expect_err("no template");
    assert_eq!(err.kind(), MgmtErrorKind::ValidationError);
}

#[test]
fn remove_halted_vm() {
    let h = harness();
    let value = h.call("mgmt.vm.Remove", "test-vm1", "", "").expect("remove");
    assert_eq!(value, "");
    assert_eq!(h.saves.count(), 1);
    let listing = h.call("mgmt.vm.List", "dom0", "", "").expect("list");
    assert!(!listing.contains("test-vm1"));
}

#[test]
fn remove_running_vm_is_rejected() {
    let h = harness();
    h.backend.set_state("test-vm1", RunState::Running);
    let err = h
        .call("mgmt.vm.Remove", "test-vm1", "", "")
        .expect_err("running");
    assert_eq!(err.kind(), MgmtErrorKind::ValidationError);
    assert_eq!(h.saves.count(), 0);
}

#[test]
fn remove_referenced_vm_is_rejected() {
    let h = harness();
    let err = h
        .call("mgmt.vm.Remove", "test-template", "", "")
        .expect_err("template in use");
    assert_eq!(err.kind(), MgmtErrorKind::ValidationError);
    assert!(err.to_string().contains("test-vm1.template"));
    assert_eq!(h.saves.count(), 0);
}

#[test]
fn feature_lifecycle() {
    let h = harness();
    assert_eq!(
        h.call("mgmt.vm.feature.List", "test-vm1", "", "")
            .expect("empty list"),
        ""
    );
    h.call("mgmt.vm.feature.Set", "test-vm1", "gui", "1")
        .expect("set");
    h.call("mgmt.vm.feature.Set", "test-vm1", "qrexec", "")
        .expect("set empty");
    assert_eq!(
        h.call("mgmt.vm.feature.List", "test-vm1", "", "").expect("list"),
        "gui\nqrexec\n"
    );
    assert_eq!(
        h.call("mgmt.vm.feature.Get", "test-vm1", "gui", "").expect("get"),
        "1"
    );

    h.call("mgmt.vm.feature.Remove", "test-vm1", "gui", "")
        .expect("remove");
    let err = h
        .call("mgmt.vm.feature.Get", "test-vm1", "gui", "")
        .expect_err("removed");
    assert_eq!(err, MgmtError::not_found("feature", "gui"));
    let err = h
        .call("mgmt.vm.feature.Remove", "test-vm1", "gui", "")
        .expect_err("already removed");
    assert_eq!(err.kind(), MgmtErrorKind::NotFound);
    assert_eq!(h.saves.count(), 3);
}

#[test]
fn feature_set_validates_name_and_value() {
    let h = harness();
    for (name, value) in [("bad/name", &b"1"[..]), ("gui", &b"\x80\x81"[..])] {
        let err = h
            .call("mgmt.vm.feature.Set", "test-vm1", name, value)
            .expect_err("invalid feature");
        assert_eq!(err.kind(), MgmtErrorKind::ValidationError);
    }
    assert_eq!(h.saves.count(), 0);
}

#[test]
fn feature_check_with_template_falls_back_to_template() {
    let h = harness();
    h.call("mgmt.vm.feature.Set", "test-template", "gui", "template-value")
        .expect("set on template");
    assert_eq!(
        h.call("mgmt.vm.feature.CheckWithTemplate", "test-vm1", "gui", "")
            .expect("inherited"),
        "template-value"
    );

    h.call("mgmt.vm.feature.Set", "test-vm1", "gui", "own-value")
        .expect("set on vm");
    assert_eq!(
        h.call("mgmt.vm.feature.CheckWithTemplate", "test-vm1", "gui", "")
            .expect("own"),
        "own-value"
    );

    let err = h
        .call("mgmt.vm.feature.CheckWithTemplate", "test-vm1", "missing", "")
        .expect_err("nowhere");
    assert_eq!(err.kind(), MgmtErrorKind::NotFound);
}

#[test]
fn tag_lifecycle() {
    let h = harness();
    assert_eq!(
        h.call("mgmt.vm.tag.Get", "test-vm1", "tag1", "").expect("get"),
        "0"
    );
    h.call("mgmt.vm.tag.Set", "test-vm1", "tag1", "").expect("set");
    h.call("mgmt.vm.tag.Set", "test-vm1", "tag1", "").expect("set again");
    assert_eq!(
        h.call("mgmt.vm.tag.Get", "test-vm1", "tag1", "").expect("get"),
        "1"
    );
    assert_eq!(
        h.call("mgmt.vm.tag.List", "test-vm1", "", "").expect("list"),
        "tag1\n"
    );

    h.call("mgmt.vm.tag.Remove", "test-vm1", "tag1", "")
        .expect("remove");
    let err = h
        .call("mgmt.vm.tag.Remove", "test-vm1", "tag1", "")
        .expect_err("already removed");
    assert_eq!(err, MgmtError::not_found("tag", "tag1"));

    let err = h
        .call("mgmt.vm.tag.Set", "test-vm1", "bad tag", "")
        .expect_err("invalid tag");
    assert_eq!(err.kind(), MgmtErrorKind::ValidationError);
    assert_eq!(h.saves.count(), 3);
}

#[test]
fn label_list_and_get() {
    let h = harness();
    assert_eq!(
        h.call("mgmt.label.List", "dom0", "", "").expect("labels"),
        "red\norange\nyellow\ngreen\ngray\nblue\npurple\nblack\n"
    );
    assert_eq!(
        h.call("mgmt.label.Get", "dom0", "red", "").expect("red"),
        "0xcc0000"
    );
    let err = h
        .call("mgmt.label.Get", "dom0", "cyan", "")
        .expect_err("unknown label");
    assert_eq!(err, MgmtError::not_found("label", "cyan"));
}

#[test]
fn label_create_and_remove() {
    let h = harness();
    h.call("mgmt.label.Create", "dom0", "cyan", "0x00FFFF")
        .expect("create");
    assert_eq!(
        h.call("mgmt.label.Get", "dom0", "cyan", "").expect("get"),
        "0x00ffff"
    );
    assert!(h
        .call("mgmt.label.List", "dom0", "", "")
        .expect("labels")
        .ends_with("black\ncyan\n"));

    let err = h
        .call("mgmt.label.Create", "dom0", "cyan", "0x000000")
        .expect_err("duplicate");
    assert_eq!(err.kind(), MgmtErrorKind::ValidationError);
    let err = h
        .call("mgmt.label.Create", "dom0", "magenta", "purple")
        .expect_err("bad colour");
    assert_eq!(err.kind(), MgmtErrorKind::ValidationError);

    h.call("mgmt.label.Remove", "dom0", "cyan", "").expect("remove");
    assert_eq!(h.saves.count(), 2);
}

#[test]
fn label_remove_rejects_builtin_in_use_and_unknown() {
    let h = harness();
    let in_use = h
        .call("mgmt.label.Remove", "dom0", "red", "")
        .expect_err("red is used by test-vm1");
    assert_eq!(in_use.kind(), MgmtErrorKind::ValidationError);
    let builtin = h
        .call("mgmt.label.Remove", "dom0", "blue", "")
        .expect_err("builtin");
    assert_eq!(builtin.kind(), MgmtErrorKind::ValidationError);
    let unknown = h
        .call("mgmt.label.Remove", "dom0", "cyan", "")
        .expect_err("unknown");
    assert_eq!(unknown.kind(), MgmtErrorKind::NotFound);

    h.call("mgmt.label.Create", "dom0", "cyan", "0x00ffff")
        .expect("create");
    h.call("mgmt.vm.property.Set", "test-vm1", "label", "cyan")
        .expect("use cyan");
    let err = h
        .call("mgmt.label.Remove", "dom0", "cyan", "")
        .expect_err("cyan in use");
    assert_eq!(err.kind(), MgmtErrorKind::ValidationError);
}

#[test]
fn host_property_calls() {
    let h = harness();
    assert_eq!(
        h.call("mgmt.property.List", "dom0", "", "").expect("list"),
        "default_netvm\ndefault_template\ndefault_kernel\nclockvm\nupdatevm\ncheck_updates_vm\n"
    );
    assert_eq!(
        h.call("mgmt.property.Get", "dom0", "check_updates_vm", "")
            .expect("get"),
        "default=True type=bool True"
    );
    h.call("mgmt.property.Set", "dom0", "clockvm", "test-vm1")
        .expect("set clockvm");
    assert_eq!(
        h.call("mgmt.property.Get", "dom0", "clockvm", "").expect("get"),
        "default=False type=vm test-vm1"
    );
    assert_eq!(
        h.call("mgmt.property.Help", "dom0", "clockvm", "").expect("help"),
        "Domain used as the network time source."
    );

    let err = h
        .call("mgmt.vm.Remove", "test-vm1", "", "")
        .expect_err("clockvm reference");
    assert!(err.to_string().contains("host.clockvm"));
}

#[test]
fn backend_methods_are_delegated() {
    let h = harness();
    let value = h.call("mgmt.vm.Start", "test-vm1", "", "").expect("start");
    assert_eq!(value, "mgmt.vm.Start on test-vm1");
    assert_eq!(h.saves.count(), 1);
    assert_eq!(h.backend.invocations(), ["mgmt.vm.Start@test-vm1"]);
    assert_eq!(h.events.count("mgmt:mgmt.vm.Start"), 1);
}

#[test]
fn backend_failure_is_reported_without_save() {
    let h = harness();
    let err = h.call("mgmt.vm.Kill", "test-vm1", "", "").expect_err("kill");
    assert_eq!(err.kind(), MgmtErrorKind::Backend);
    assert_eq!(h.saves.count(), 0);
    assert_eq!(h.events.count("mgmt:mgmt.vm.Kill"), 0);
}

#[test]
fn concurrent_calls_serialize_on_application_state() {
    let h = harness();
    thread::scope(|scope| {
        for worker in 0..8 {
            let h = &h;
            scope.spawn(move || {
                let tag = format!("worker-{worker}");
                h.call("mgmt.vm.tag.Set", "test-vm1", &tag, "")
                    .expect("tag set");
                h.get("test-vm1", "vcpus");
            });
        }
    });

    let tags = h.call("mgmt.vm.tag.List", "test-vm1", "", "").expect("tags");
    assert_eq!(tags.lines().count(), 8);
    assert_eq!(h.saves.count(), 8);
    assert_eq!(h.permission_events("mgmt.vm.tag.Set"), 8);
}
