use std::future::Future;

use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use smt_engine::chain::TransformChain;
use smt_engine::codec::{decode_line, encode_line};
use smt_engine::config::ChainConfig;
use smt_engine::error::EngineError;
use smt_engine::registry::TransformRegistry;

#[derive(Parser)]
#[command(
    name = "smt-runner",
    about = "Apply a transform chain to JSON-lines records from stdin"
)]
struct Cli {
    /// Path to TOML chain configuration file.
    #[arg(long, default_value = "chain.toml", env = "SMT_CONFIG")]
    config: String,

    /// Print the available transform types and their parameters, then exit.
    #[arg(long)]
    list: bool,

    /// Skip records that fail to decode or transform instead of stopping.
    #[arg(long)]
    skip_errors: bool,
}

fn builtin_registry() -> Result<TransformRegistry, EngineError> {
    let mut registry = TransformRegistry::new();
    registry.register(smt_transform_identity::descriptor())?;
    registry.register(smt_transform_integrity::descriptor())?;
    registry.register(smt_transform_rename_field::descriptor())?;
    registry.register(smt_transform_purchase_items::descriptor())?;
    registry.register(smt_transform_purchase_items::merged_descriptor())?;
    Ok(registry)
}

fn print_transforms(registry: &TransformRegistry) {
    for alias in registry.aliases() {
        let Some(descriptor) = registry.get(alias) else { continue };
        println!("{alias}: {}", descriptor.description);
        for param in (descriptor.config_params)() {
            let default = match &param.default {
                None => "required".to_string(),
                Some(default) => format!("default {default:?}"),
            };
            println!(
                "    {} ({default}, {} importance): {}",
                param.name, param.importance, param.description
            );
        }
    }
}

/// Transform one input line. `Ok(None)` for blank lines.
fn process_line(chain: &TransformChain, line: &str) -> Result<Option<String>, EngineError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let record = decode_line(line)?;
    let record = chain.apply(record)?;
    encode_line(&record).map(Some)
}

/// Copy records from `input` to `output` through the chain until the input
/// ends or `interrupt` completes.
async fn run<R, W, F>(
    chain: &TransformChain,
    input: R,
    output: &mut W,
    interrupt: F,
    skip_errors: bool,
) -> Result<(), EngineError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future,
{
    let mut lines = input.lines();
    let mut line_no: u64 = 0;
    let mut written: u64 = 0;
    let mut skipped: u64 = 0;
    tokio::pin!(interrupt);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut interrupt => {
                tracing::info!("interrupted, stopping");
                break;
            }
        };
        let Some(line) = line else { break };
        line_no += 1;

        match process_line(chain, &line) {
            Ok(Some(out)) => {
                output.write_all(out.as_bytes()).await?;
                output.write_all(b"\n").await?;
                written += 1;
            }
            Ok(None) => {}
            Err(e) if skip_errors => {
                tracing::warn!(line = line_no, error = %e, "skipping record");
                skipped += 1;
            }
            Err(e) => return Err(e.with_context(format!("line {line_no}"))),
        }
    }

    output.flush().await?;
    tracing::info!(records = written, skipped, "input exhausted");
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let registry = match builtin_registry() {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "failed to register transforms");
            std::process::exit(1);
        }
    };

    if cli.list {
        print_transforms(&registry);
        return;
    }

    tracing::info!(config = %cli.config, "loading configuration");
    let config = match ChainConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let chain = match TransformChain::build(&config, &registry) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to build transform chain");
            std::process::exit(1);
        }
    };
    tracing::info!(transforms = chain.len(), "smt-runner started, reading stdin");

    let result = run(
        &chain,
        BufReader::new(tokio::io::stdin()),
        &mut tokio::io::stdout(),
        tokio::signal::ctrl_c(),
        cli.skip_errors,
    )
    .await;
    chain.close();
    if let Err(e) = result {
        tracing::error!(error = %e, "processing failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_builtin_alias() {
        let registry = builtin_registry().unwrap();
        let aliases: Vec<&str> = registry.aliases().collect();
        assert_eq!(
            aliases,
            [
                "identity",
                "integrity",
                "purchase-items",
                "purchase-items-merged",
                "rename-field"
            ]
        );
    }

    fn rename_chain() -> TransformChain {
        let config = ChainConfig::parse(
            r#"
            [[transforms]]
            name = "rename"
            type = "rename-field"
            [transforms.config]
            "field.current" = "a"
            "field.new" = "b"
            "#,
        )
        .unwrap();
        TransformChain::build(&config, &builtin_registry().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn copies_every_record_until_input_ends() {
        let input: &[u8] = b"{\"topic\":\"t\",\"value\":{\"a\":1}}\n\n{\"topic\":\"u\",\"value\":{\"a\":2}}\n";
        let mut output = Vec::new();
        run(&rename_chain(), input, &mut output, std::future::pending::<()>(), false)
            .await
            .unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                r#"{"topic":"t","key":null,"value":{"b":1}}"#,
                r#"{"topic":"u","key":null,"value":{"b":2}}"#
            ]
        );
    }

    #[tokio::test]
    async fn interrupt_stops_a_blocked_reader() {
        // The writer half stays open, so the reader never sees end of input.
        let (_writer, reader) = tokio::io::duplex(64);
        let mut output = Vec::new();
        run(
            &rename_chain(),
            BufReader::new(reader),
            &mut output,
            std::future::ready(()),
            false,
        )
        .await
        .unwrap();
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn bad_lines_stop_the_run_unless_skipped() {
        let input: &[u8] = b"{\n{\"topic\":\"t\",\"value\":{\"a\":1}}\n";
        let mut output = Vec::new();
        let err = run(&rename_chain(), input, &mut output, std::future::pending::<()>(), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("line 1"));

        let mut output = Vec::new();
        run(&rename_chain(), input, &mut output, std::future::pending::<()>(), true)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(output).unwrap().lines().count(), 1);
    }

    #[test]
    fn blank_lines_are_skipped_and_records_encoded() {
        let chain = rename_chain();

        assert_eq!(process_line(&chain, "   ").unwrap(), None);
        let out = process_line(&chain, r#"{"topic":"t","value":{"a":1}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(out, r#"{"topic":"t","key":null,"value":{"b":1}}"#);
        assert!(process_line(&chain, "{").is_err());
    }
}
