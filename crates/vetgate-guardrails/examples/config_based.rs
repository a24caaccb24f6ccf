//! Configuration-Based Validation
//!
//! Shows how to build validation engines from a config file/struct
//! instead of hardcoding in code, and how per-session engines keep
//! stateful guardrails isolated.
//!
//! Run with:
//! ```bash
//! cargo run -p vetgate-guardrails --example config_based
//! ```

use std::collections::HashMap;

use vetgate_guardrails::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("⚙️  Configuration-Based Validation Demo\n");

    // Example 1: Load from code (simulating a config file)
    println!("=== Example 1: From Configuration ===");

    let pipeline = PipelineConfig {
        enabled: true,
        log_capacity: 500,
        input: config::StageConfig {
            rate_limiter: config::RateLimiterConfig {
                enabled: true,
                max_per_minute: 30,
                max_per_hour: 500,
            },
            pii_redactor: config::PiiRedactorConfig {
                enabled: true,
                extra_patterns: HashMap::new(),
            },
            profanity_filter: config::ProfanityFilterConfig {
                enabled: true,
                blocked_words: vec!["password".to_string(), "secret".to_string()],
                evasion_patterns: vec![r"p[a4]ssw[o0]rd".to_string()],
            },
            length_limiter: config::LengthLimiterConfig {
                enabled: true,
                max_length: 200,
                min_length: 1,
            },
            ..Default::default()
        },
        output: config::StageConfig {
            domain_allowlist: config::DomainAllowlistConfig {
                enabled: true,
                allowed_domains: vec!["docs.example.com".to_string()],
                max_calls_per_window: 20,
                window_seconds: 60,
            },
            ..Default::default()
        },
    };

    let engine = pipeline.build_engine()?;

    if let Some(engine) = engine {
        println!(
            "✓ Built engine with {} input / {} output guardrails\n",
            engine.guardrail_count(Stage::Input),
            engine.guardrail_count(Stage::Output)
        );

        let context = CheckContext::for_session("session-1").with_user("alice");

        // Safe input
        let run = engine.validate(Stage::Input, "What is 2 + 2?", &context).await;
        println!("Safe input passed: {}", run.overall_passed);

        // Blocked word gets masked
        let run = engine
            .validate(Stage::Input, "My secret is hunter2", &context)
            .await;
        println!("Blocked word rewritten as: {}", run.final_content);

        // National id pattern gets redacted
        let run = engine
            .validate(Stage::Input, "My SSN is 123-45-6789", &context)
            .await;
        println!("Id number rewritten as:    {}", run.final_content);
        for result in run.results.iter().filter(|r| !r.passed) {
            println!("  - {}: {}", result.rule_name, result.message);
        }

        // Output URL policy
        let run = engine
            .validate(
                Stage::Output,
                "Details at https://untrusted.example.org/doc",
                &context,
            )
            .await;
        println!("Untrusted URL passed: {}", run.overall_passed);
    } else {
        println!("No guardrails configured");
    }

    // Example 2: Serialization (save/load config)
    println!("\n=== Example 2: Configuration Serialization ===");

    let json = serde_json::to_string_pretty(&pipeline)?;
    println!("Configuration as JSON:");
    println!("{}", json);

    // Example 3: Per-session engines
    println!("\n=== Example 3: Per-Session Engines ===");

    let sessions = SessionEngines::new(pipeline.clone());
    let alice = sessions.get_or_create("alice")?.ok_or("engine expected")?;
    let bob = sessions.get_or_create("bob")?.ok_or("engine expected")?;

    let context = CheckContext::default();
    alice.validate(Stage::Input, "hello from alice", &context).await;
    bob.validate(Stage::Input, "hello from bob", &context).await;

    println!("Tracked sessions: {:?}", sessions.session_ids());
    println!(
        "Alice engine runs: {}, Bob engine runs: {}",
        alice.get_statistics().total_runs,
        bob.get_statistics().total_runs
    );

    println!("\n✅ Configuration-based validation demo complete!");
    println!("\n💡 In your app:");
    println!("  1. Load config from config.toml or environment");
    println!("  2. Call config.build_engine() or SessionEngines::new(config)");
    println!("  3. Validate input before the model and output after it");
    println!("  4. Inspect get_statistics() and recent_entries() for audits");

    Ok(())
}
