use anyhow::Result;
use clausewatch::{Config, SitePipeline};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::report::print_report;

const BANNER_RULE: &str =
    "======================================================================";

/// Reply to the disclaimer prompt: `Some(true)` accepts, `Some(false)` rejects.
fn parse_choice(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "accept" | "a" | "yes" | "y" => Some(true),
        "reject" | "r" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn is_quit(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "quit" | "exit" | "q")
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

async fn accept_disclaimer(lines: &mut Lines<BufReader<Stdin>>) -> Result<bool> {
    println!("{BANNER_RULE}");
    println!("CLAUSEWATCH DISCLAIMER");
    println!("{BANNER_RULE}");
    println!(
        "Results are produced by keyword heuristics, not legal advice. \
         Decisions you make based on them are your own responsibility."
    );
    println!("Expect false positives and missed clauses.");
    println!("{BANNER_RULE}");

    loop {
        println!("\nDo you accept these terms? (Type 'accept' or 'reject')");
        prompt("Your choice: ");
        let Some(line) = lines.next_line().await? else {
            return Ok(false);
        };
        match parse_choice(&line) {
            Some(true) => {
                println!("\nTerms accepted. Let's analyze some Terms & Conditions!\n");
                return Ok(true);
            }
            Some(false) => {
                println!("\nTerms rejected. Goodbye!");
                return Ok(false);
            }
            None => println!("Please type 'accept' or 'reject'"),
        }
    }
}

pub async fn run_repl(config: &Config, disclaimer_accepted: bool, json: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if !disclaimer_accepted && !accept_disclaimer(&mut lines).await? {
        return Ok(());
    }

    let pipeline = SitePipeline::from_config(config)?;
    println!("Enter a website to analyze its Terms & Conditions.\n");

    loop {
        prompt("Enter a website URL (or 'quit' to exit): ");
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let input = line.trim();

        if is_quit(input) {
            println!("Thanks for using clausewatch!");
            break;
        }
        if input.is_empty() {
            println!("Please enter a valid URL.");
            continue;
        }

        let report = pipeline.analyze_site(input).await;
        print_report(&report, json)?;
    }

    pipeline.flush();
    Ok(())
}
