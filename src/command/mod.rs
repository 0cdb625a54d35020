mod batch;

use colored::Colorize;
use crate::Error;

/// Print tool version and authors.
pub(crate) fn print_version() {
    println!("{} {}", env!("CARGO_PKG_NAME").underline(), format!("v{}", env!("CARGO_PKG_VERSION")).green());
    let authors = env!("CARGO_PKG_AUTHORS");
    if !authors.is_empty() {
        println!("Created by {}", authors.split(':').collect::<Vec<_>>().join(", ").bright_blue());
    }
}

fn print_citation() {
    print_version();
    println!();
    println!("{}", "Thank you for using our tool!".bold());
    println!("Publication in progress, please check later.");
}

/// Without arguments (and with any regular option) the full batch is executed;
/// the `help`, `version` and `cite` words are recognized as the first argument.
pub fn run(argv: &[String]) -> Result<(), Error> {
    match argv.get(1).map(String::as_str) {
        Some("help" | "h") => batch::print_help(),
        Some("version" | "-V" | "--version") => print_version(),
        Some("cite") => print_citation(),
        _ => batch::run(&argv[1..])?,
    }
    Ok(())
}
