use clap::{Parser, Subcommand, ValueEnum};
use plait_calc::{AngleMode, CalcConfig, Calculator};
use tracing::info;

#[derive(Parser)]
#[command(name = "plait")]
#[command(about = "Evaluate arithmetic expressions with plait")]
#[command(version)]
struct Cli {
    /// Unit for trigonometric functions
    #[arg(long, value_enum, default_value = "radian", global = true)]
    angle: Angle,

    /// Name shown in error messages
    #[arg(long, default_value = "calculator", global = true)]
    module: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Angle {
    /// No trigonometric functions
    None,
    Radian,
    Degree,
}

impl From<Angle> for AngleMode {
    fn from(angle: Angle) -> Self {
        match angle {
            Angle::None => AngleMode::None,
            Angle::Radian => AngleMode::Radian,
            Angle::Degree => AngleMode::Degree,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate expressions and print one result per line
    Eval {
        /// Expressions to evaluate
        #[arg(required = true)]
        expressions: Vec<String>,
    },

    /// Check expressions for errors without printing results
    Check {
        /// Expressions to check
        #[arg(required = true)]
        expressions: Vec<String>,
    },
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let config = CalcConfig::default()
        .with_angle_mode(cli.angle.into())
        .with_module(cli.module);
    info!(angle = ?cli.angle, "calculator ready");
    let calc = Calculator::with_config(config);

    let ok = match cli.command {
        Command::Eval { expressions } => cmd_eval(&calc, &expressions),
        Command::Check { expressions } => cmd_check(&calc, &expressions),
    };
    if !ok {
        std::process::exit(1);
    }
}

fn cmd_eval(calc: &Calculator, expressions: &[String]) -> bool {
    let mut ok = true;
    for expression in expressions {
        match calc.evaluate(expression) {
            Ok(value) => println!("{value}"),
            Err(e) => {
                eprintln!("Error: '{expression}': {e}");
                ok = false;
            }
        }
    }
    ok
}

fn cmd_check(calc: &Calculator, expressions: &[String]) -> bool {
    let mut ok = true;
    for expression in expressions {
        match calc.check(expression) {
            Ok(()) => eprintln!("OK: {expression}"),
            Err(e) => {
                eprintln!("Error: '{expression}': {e}");
                ok = false;
            }
        }
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_eval_with_angle() {
        let cli = Cli::try_parse_from(["plait", "eval", "--angle", "degree", "sin(90)", "1+1"])
            .unwrap();
        assert_eq!(cli.angle, Angle::Degree);
        assert_eq!(AngleMode::from(cli.angle), AngleMode::Degree);
        match cli.command {
            Command::Eval { expressions } => assert_eq!(expressions, vec!["sin(90)", "1+1"]),
            Command::Check { .. } => panic!("expected eval"),
        }
    }

    #[test]
    fn test_eval_requires_expression() {
        assert!(Cli::try_parse_from(["plait", "eval"]).is_err());
    }

    #[test]
    fn test_commands_report_failures() {
        let calc = Calculator::default();
        assert!(cmd_eval(&calc, &["1 + 2".to_string()]));
        assert!(!cmd_check(&calc, &["1 +".to_string(), "2".to_string()]));
    }
}
