use colored::Colorize;
use graphwright_compare::{Change, Comparison, Criticality};

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_change(change: &Change) {
    let label = match change.criticality {
        Criticality::Breaking => "breaking".red().bold(),
        Criticality::Dangerous => "dangerous".yellow().bold(),
        Criticality::NonBreaking => "non-breaking".green(),
    };
    println!("{label:>12}  {}", change.message);
    if let Some(reason) = change.reason {
        println!("{:>12}  {}", "", reason.dimmed());
    }
}

pub fn print_summary(comparison: &Comparison) {
    if comparison.is_empty() {
        print_success("No changes detected");
        return;
    }
    println!();
    println!(
        "{}: {} breaking, {} dangerous, {} non-breaking",
        "Summary".cyan(),
        comparison.breaking().count(),
        comparison.dangerous().count(),
        comparison.non_breaking().count()
    );
}
