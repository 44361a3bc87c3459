//! The `questionbank init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    for (path, content) in [
        ("questionbank.toml", SAMPLE_CONFIG),
        ("questions.toml", SAMPLE_CATALOG),
        ("program.toml", SAMPLE_PROGRAM),
    ] {
        if Path::new(path).exists() {
            println!("{path} already exists, skipping.");
        } else {
            std::fs::write(path, content)?;
            println!("Created {path}");
        }
    }

    println!("\nNext steps:");
    println!("  1. Run: questionbank bank --block 1");
    println!("  2. Run: questionbank add --block 1 --question 4");
    println!("  3. Run: questionbank repeat --enumerator 4");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# questionbank configuration

catalog = "questions.toml"
program = "program.toml"
format = "text"
reports_dir = "./questionbank-reports"
"#;

const SAMPLE_CATALOG: &str = r#"# Question catalog

[[questions]]
id = 1
name = "apc-address"
description = "Applicant's home address"
type = "address"

[[questions]]
id = 2
name = "apc-name"
description = "Applicant's full name"
type = "name"

[[questions]]
id = 3
name = "apc-text"
description = "Anything else we should know"
type = "text"

[[questions]]
id = 4
name = "apc-enumerator"
description = "Household members"
type = "enumerator"

[[questions]]
id = 5
name = "apc-repeated"
description = "Household member's occupation"
type = "text"
enumerator = 4
"#;

const SAMPLE_PROGRAM: &str = r#"[program]
id = 1
name = "apc program"
description = "Sample program"

[[blocks]]
id = 1
name = "Block 1"
questions = []
"#;
