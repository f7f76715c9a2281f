//! XJP Identity Agent - 主机账户与用户组管理代理
//!
//! Usage:
//! - Normal mode: `xjp-identity-agent`
//! - With custom port: `xjp-identity-agent --port 19877`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xjp_identity_agent::RuntimeConfig;

/// 解析命令行参数
fn parse_args() -> RuntimeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port_override = args[i + 1].parse().ok();
                if config.port_override.is_none() {
                    eprintln!("Ignoring invalid port: {}", args[i + 1]);
                }
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    config
}

fn print_help() {
    println!("XJP Identity Agent - 主机账户与用户组管理代理");
    println!();
    println!("USAGE:");
    println!("    xjp-identity-agent [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>    Override the listening port");
    println!("    -h, --help       Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    IDENTITY_AGENT_PORT     Listening port (default 9877, falls back to PORT)");
    println!("    IDENTITY_AGENT_BIND     Bind address (default 0.0.0.0)");
    println!("    COMMAND_TIMEOUT_SECS    Per-command timeout (default 15)");
    println!("    IDENTITY_PLATFORM       Force platform: posix | windows | unsupported");
    println!("    BULK_CONCURRENCY        Parallel membership changes (default 4)");
    println!("    DEFAULT_SHELL           Shell for new users (default /bin/bash)");
    println!("    HOME_BASE               Parent of new home directories (default /home)");
    println!("    RUST_LOG                Log filter");
    println!();
    println!("EXAMPLES:");
    println!("    xjp-identity-agent                  # Normal mode");
    println!("    xjp-identity-agent --port 19877     # Custom port");
}

fn main() {
    let config = parse_args();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xjp_identity_agent=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(xjp_identity_agent::init_and_run_agent_with_config(config)) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
