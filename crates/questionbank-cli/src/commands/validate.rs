//! The `questionbank validate` command.

use anyhow::Result;

use questionbank_core::parser;
use questionbank_core::validation::{check_catalog, check_program, Violation};

use super::resolve_config;
use crate::PathArgs;

pub fn execute(paths: &PathArgs) -> Result<()> {
    let config = resolve_config(paths)?;
    let catalog = parser::parse_catalog(&config.catalog)?;

    println!(
        "Catalog: {} ({} questions)",
        config.catalog.display(),
        catalog.len()
    );
    let catalog_violations = check_catalog(&catalog);
    print_violations(&catalog_violations);
    let mut total = catalog_violations.len();

    let programs = if config.program.is_dir() {
        parser::load_program_directory(&config.program)?
    } else {
        vec![parser::parse_program(&config.program)?]
    };

    for program in &programs {
        println!(
            "Program: {} (id {}, {} blocks)",
            program.name,
            program.id,
            program.blocks.len()
        );
        let violations = check_program(program, &catalog);
        print_violations(&violations);
        total += violations.len();
    }

    if total == 0 {
        println!("All programs valid.");
        Ok(())
    } else {
        println!("\n{total} violation(s) found.");
        anyhow::bail!("validation failed")
    }
}

fn print_violations(violations: &[Violation]) {
    for v in violations {
        let prefix = match (v.block, v.question) {
            (Some(b), Some(q)) => format!("  [block {b}, question {q}]"),
            (Some(b), None) => format!("  [block {b}]"),
            (None, Some(q)) => format!("  [question {q}]"),
            (None, None) => "  ".to_string(),
        };
        println!("{prefix} ERROR: {}", v.message);
    }
}
