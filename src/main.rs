use azure_firewall_audit::output::{print_report, print_violations_csv};
use azure_firewall_audit::{definite_violation_count, run_audit};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    log4rs::init_file("log4rs.yml", Default::default()).expect("Error initializing log4rs");
    dotenv::dotenv().ok();

    log::info!("#Start main()");

    let args: Vec<String> = std::env::args().collect();
    let csv = args.iter().any(|a| a == "--csv");
    let mut positional = args.iter().skip(1).filter(|a| !a.starts_with("--"));
    let snapshot_file = positional
        .next()
        .cloned()
        .or_else(|| std::env::var("FIREWALL_SNAPSHOT").ok());
    let allowlist_file = positional
        .next()
        .cloned()
        .or_else(|| std::env::var("FIREWALL_ALLOWLIST").ok())
        .expect("Usage: azure-firewall-audit <snapshot.json> <allowlist.json> [--csv]");

    let findings =
        run_audit(snapshot_file.as_deref(), &allowlist_file).expect("Error running audit");

    if csv {
        print_violations_csv(&findings);
    } else {
        print_report(&findings);
    }

    let violations = definite_violation_count(&findings);
    if violations > 0 {
        log::warn!("{violations} firewalls definitely violate the allowlist");
        std::process::exit(1);
    }

    Ok(())
}
