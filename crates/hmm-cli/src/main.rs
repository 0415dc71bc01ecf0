//! hmm-infer - Viterbi decoding and forward evaluation for discrete HMMs
//!
//! Loads a model (file, environment, XDG config or built-in preset), maps
//! observation tokens to symbols and prints a JSON or text report on stdout.
//! Logs go to stderr.

use clap::{Args, Parser, Subcommand};
use hmm_cli::config::{load_model, read_observation_file, LoadOptions, LoadedModel};
use hmm_cli::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use hmm_cli::output::{
    render, CheckReport, DecodeReport, DecodedStep, ErrorReport, EvaluateReport, OutputFormat,
    PresetsReport, RenderText, ReportHeader,
};
use hmm_cli::{CliError, ExitCode};
use hmm_config::{list_presets, PresetName};
use hmm_core::{ForwardEvaluator, ForwardMode, ViterbiDecoder};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// Decode and evaluate observation sequences with a discrete hidden Markov model
#[derive(Parser)]
#[command(name = "hmm-infer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Model file (JSON); also read from HMM_INFER_MODEL
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Built-in model to use when no model file is given
    #[arg(long, global = true)]
    preset: Option<PresetName>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log output format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Reject models whose distributions do not sum to 1
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Most probable hidden-state path (Viterbi)
    Decode(DecodeArgs),

    /// Total probability of the observations (forward algorithm)
    Evaluate(EvaluateArgs),

    /// Check that every distribution in the model sums to 1
    Check,

    /// List built-in models
    Presets,
}

#[derive(Args, Debug)]
struct ObservationArgs {
    /// Observation tokens: symbol labels or indices
    #[arg(value_name = "OBS")]
    observations: Vec<String>,

    /// Read observation tokens from a file (whitespace or comma separated)
    #[arg(long, value_name = "PATH")]
    obs_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    #[command(flatten)]
    obs: ObservationArgs,

    /// Include the full log-domain score table
    #[arg(long)]
    scores: bool,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    #[command(flatten)]
    obs: ObservationArgs,

    /// Accumulate in log space (overrides the model's forward_mode)
    #[arg(long)]
    log_space: bool,

    /// Force linear-domain accumulation
    #[arg(long, conflicts_with = "log_space")]
    linear: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not errors
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = e.print();
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            let code = e.exit_code();
            report_error(cli.global.format, code, &e);
            code
        }
    };

    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    match &cli.command {
        Commands::Decode(args) => run_decode(&cli.global, args),
        Commands::Evaluate(args) => run_evaluate(&cli.global, args),
        Commands::Check => run_check(&cli.global),
        Commands::Presets => run_presets(&cli.global),
    }
}

fn load_options(global: &GlobalOpts) -> LoadOptions {
    LoadOptions {
        model_path: global.model.clone(),
        preset: global.preset,
        strict: global.strict,
        lenient: false,
    }
}

/// Collect tokens from arguments and `--obs-file`, then map them to symbols.
fn encode(loaded: &LoadedModel, args: &ObservationArgs) -> Result<Vec<usize>, CliError> {
    let mut tokens = args.observations.clone();
    if let Some(ref path) = args.obs_file {
        tokens.extend(read_observation_file(path)?);
    }
    let observations = loaded
        .model
        .encode_observations(tokens.as_slice())
        .map_err(hmm_cli::ConfigError::from)?;
    debug!(num_steps = observations.len(), "observations encoded");
    Ok(observations)
}

fn run_decode(global: &GlobalOpts, args: &DecodeArgs) -> Result<ExitCode, CliError> {
    let loaded = load_model(&load_options(global))?;
    let observations = encode(&loaded, &args.obs)?;

    let path = ViterbiDecoder::decode(&loaded.params, &observations)?;
    let confidence = path.path_confidence();

    let steps = observations
        .iter()
        .zip(&path.states)
        .zip(confidence)
        .map(|((&obs, &state), confidence)| DecodedStep {
            observation: obs,
            observation_label: loaded.model.symbol_label(obs),
            state,
            state_label: loaded.model.state_label(state),
            confidence,
        })
        .collect();

    let report = DecodeReport {
        header: ReportHeader::new("decode"),
        model: loaded.snapshot.clone(),
        states: path.states.clone(),
        steps,
        log_probability: path.log_probability(),
        scores: args.scores.then(|| path.scores.to_rows()),
    };
    emit(global.format, &report)?;
    Ok(ExitCode::Clean)
}

fn run_evaluate(global: &GlobalOpts, args: &EvaluateArgs) -> Result<ExitCode, CliError> {
    let loaded = load_model(&load_options(global))?;
    let observations = encode(&loaded, &args.obs)?;

    let mode = if args.log_space {
        ForwardMode::Log
    } else if args.linear {
        ForwardMode::Linear
    } else {
        loaded.model.forward_mode
    };
    let outcome = ForwardEvaluator::evaluate_with(&loaded.params, &observations, mode)?;

    let report = EvaluateReport {
        header: ReportHeader::new("evaluate"),
        model: loaded.snapshot.clone(),
        observations,
        mode: outcome.mode,
        probability: outcome.probability,
        log_probability: outcome.log_probability,
    };
    emit(global.format, &report)?;
    Ok(ExitCode::Clean)
}

fn run_check(global: &GlobalOpts) -> Result<ExitCode, CliError> {
    let loaded = load_model(&LoadOptions {
        lenient: true,
        ..load_options(global)
    })?;

    let tolerance = loaded.model.validation.tolerance;
    let check = loaded.params.validate_stochastic_with(tolerance);

    let report = CheckReport {
        header: ReportHeader::new("check"),
        model: loaded.snapshot.clone(),
        valid: check.valid,
        tolerance,
        violation: check.violation,
    };
    emit(global.format, &report)?;

    if check.valid {
        Ok(ExitCode::Clean)
    } else {
        Ok(ExitCode::NotStochastic)
    }
}

fn run_presets(global: &GlobalOpts) -> Result<ExitCode, CliError> {
    let report = PresetsReport {
        header: ReportHeader::new("presets"),
        presets: list_presets(),
    };
    emit(global.format, &report)?;
    Ok(ExitCode::Clean)
}

fn emit<R: Serialize + RenderText>(format: OutputFormat, report: &R) -> Result<(), CliError> {
    print!("{}", render(format, report)?);
    Ok(())
}

fn report_error(format: OutputFormat, code: ExitCode, err: &CliError) {
    let report = ErrorReport::new(code, err.to_string());
    eprint!("{}", report.render_text());
    if format == OutputFormat::Json {
        if let Ok(json) = render(format, &report) {
            print!("{}", json);
        }
    }
}
