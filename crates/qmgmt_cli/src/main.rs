//! Command-line driver for one management call.
//!
//! # Responsibility
//! - Build the demo registry (`dom0`, `test-template`, `test-vm1`).
//! - Execute a single call and print its response or error kind.

use clap::Parser;
use log::error;
use qmgmt_core::{
    default_log_level, init_logging, App, DenyList, MgmtCall, MgmtConfig, MgmtResult,
    MgmtService, NoopPersistence, OfflineControl, VmClass,
};
use std::process::ExitCode;
use std::sync::Arc;

/// Execute one management call against an in-memory demo registry.
#[derive(Parser, Debug)]
#[command(name = "qmgmt", version, about = "Management call driver")]
struct Args {
    /// Method identifier, e.g. mgmt.vm.property.Get
    method: String,

    /// Destination domain name
    #[arg(default_value = "dom0")]
    destination: String,

    /// Method argument
    #[arg(short, long, default_value = "")]
    arg: String,

    /// Call payload
    #[arg(short, long, default_value = "")]
    payload: String,

    /// Method names the policy layer denies
    #[arg(long)]
    deny: Vec<String>,

    /// Allow dom0 as destination of VM-only methods
    #[arg(long)]
    allow_dom0_for_vm_methods: bool,

    /// Accept label names that are not registered
    #[arg(long)]
    skip_label_check: bool,

    /// Absolute directory for log files; logging is off when omitted
    #[arg(long)]
    log_dir: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long)]
    log_level: Option<String>,
}

fn demo_app(config: MgmtConfig) -> MgmtResult<App> {
    let mut app = App::new(config);
    app.add_new_vm(VmClass::TemplateVm, "test-template", "black", None)?;
    app.add_new_vm(VmClass::AppVm, "test-vm1", "red", Some("test-template"))?;
    Ok(app)
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(log_dir) = args.log_dir.as_deref() {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let config = MgmtConfig {
        enforce_vm_only: !args.allow_dom0_for_vm_methods,
        check_label_existence: !args.skip_label_check,
        ..MgmtConfig::default()
    };
    let app = match demo_app(config) {
        Ok(app) => app,
        Err(err) => {
            error!("event=demo_setup module=cli status=error kind={}", err.kind());
            eprintln!("{}: {err}", err.kind());
            return ExitCode::FAILURE;
        }
    };

    let mut service = MgmtService::new(app, Arc::new(NoopPersistence), Arc::new(OfflineControl));
    if !args.deny.is_empty() {
        service.add_policy(Arc::new(DenyList::new(args.deny)));
    }

    let call = MgmtCall::new(&args.method, &args.destination, &args.arg, &args.payload);
    match service.execute(&call) {
        Ok(response) => {
            print!("{response}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {err}", err.kind());
            ExitCode::FAILURE
        }
    }
}
