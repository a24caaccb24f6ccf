//! Validation Pipeline Demo
//!
//! Demonstrates the validation engine and the built-in guardrails.
//!
//! Run with:
//! ```bash
//! cargo run -p vetgate-guardrails --example pipeline_demo
//! ```

use vetgate_guardrails::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("🛡️  Validation Engine Demo\n");

    // The repetition filter keeps shared history, so a clone registered in
    // the engine can still be fed by the caller
    let repetition = RepetitionFilter::new(0.6, 5)?;
    let repetition_handle = repetition.clone();

    let engine = ValidationEngine::new()
        .with_input_guardrail(PiiRedactor::new()?)?
        .with_input_guardrail(ProfanityFilter::new(vec!["darn".to_string()])?)?
        .with_input_guardrail(LengthLimiter::new(80, 0)?)?
        .with_output_guardrail(repetition)?
        .with_output_guardrail(DomainAllowlist::new(
            vec!["docs.example.com".to_string()],
            10,
        )?)?;

    println!(
        "Created engine with {} input / {} output guardrails\n",
        engine.guardrail_count(Stage::Input),
        engine.guardrail_count(Stage::Output)
    );

    let context = CheckContext::for_session("demo-session");

    // Test 1: Clean input (should pass)
    println!("=== Test 1: Clean Input ===");
    let run = engine
        .validate(Stage::Input, "What is 2 + 2?", &context)
        .await;
    print_run(&run);

    // Test 2: PII redaction
    println!("=== Test 2: PII Redaction ===");
    let run = engine
        .validate(
            Stage::Input,
            "Reach me at alice@example.com or 555-867-5309",
            &context,
        )
        .await;
    print_run(&run);

    // Test 3: Truncation (warning, does not block)
    println!("=== Test 3: Truncation ===");
    let long = "This reply goes on and on ".repeat(8);
    let run = engine.validate(Stage::Input, &long, &context).await;
    print_run(&run);

    // Test 4: Rate limiting
    println!("=== Test 4: Rate Limiting ===");
    let limited = ValidationEngine::new().with_input_guardrail(RateLimiter::new(2, 100)?)?;
    for i in 1..=4 {
        let run = limited.validate(Stage::Input, "request", &context).await;
        if run.overall_passed {
            println!("  Request {}: ✓ Allowed", i);
        } else {
            println!("  Request {}: ✗ Rate limited", i);
        }
    }
    println!();

    // Test 5: Repetition (history is recorded by the caller)
    println!("=== Test 5: Repetition ===");
    let reply = "The weather is sunny today";
    let run = engine.validate(Stage::Output, reply, &context).await;
    println!("First reply passed: {}", run.overall_passed);
    repetition_handle.update_context(reply);

    let run = engine
        .validate(Stage::Output, "The weather is sunny today!", &context)
        .await;
    println!("Near-duplicate reply passed: {}", run.overall_passed);
    println!("Rewritten as: {}\n", run.final_content);

    // Test 6: URL allowlist
    println!("=== Test 6: URL Allowlist ===");
    let run = engine
        .validate(
            Stage::Output,
            "See https://docs.example.com/guide for details",
            &context,
        )
        .await;
    println!("Allowed domain passed: {}", run.overall_passed);

    let run = engine
        .validate(
            Stage::Output,
            "See https://evil.example.net/page instead",
            &context,
        )
        .await;
    println!("Disallowed domain passed: {}", run.overall_passed);
    if let Some(result) = run.results.iter().find(|r| !r.passed) {
        println!("  - {}: {}\n", result.rule_name, result.message);
    }

    // Statistics and execution log
    println!("=== Statistics ===");
    let stats = engine.get_statistics();
    println!("Total runs: {}", stats.total_runs);
    for g in &stats.per_guardrail {
        println!("  {} [{}]: {} activation(s)", g.name, g.stage, g.activation_count);
    }

    let entries = engine.recent_entries(5);
    println!("\nLast {} log entries:", entries.len());
    for entry in &entries {
        println!(
            "  [{}] {} passed={} failed={:?}",
            entry.timestamp, entry.stage, entry.overall_passed, entry.failed_guardrails
        );
    }

    println!("\n✅ Validation demo complete!");

    Ok(())
}

fn print_run(run: &ValidationRun) {
    if run.overall_passed {
        println!("✓ Passed");
    } else {
        println!("✗ Blocked");
    }
    for result in &run.results {
        if !result.passed {
            println!("  - {} [{}]: {}", result.rule_name, result.severity, result.message);
        }
    }
    println!("  Final content: {}\n", run.final_content);
}
