//! QuickRead CLI binary: summarize or translate text from the command line.
//!
//! Subcommands: `run` (one task), `chunk` (show segmentation), `limits` (resolved input
//! limits), `history` (one task per input line, then the result history).

mod log_format;
mod logging;

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use cli::{
    build_request, chunk_command, history_command, limits_command, read_input, run_command,
    CliError, TaskArgs,
};
use quickread::{ActionType, MediaType, QuickRead, TaskOptions};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "quickread")]
#[command(about = "QuickRead: summarize or translate text with Gemini from the command line")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Directory with a prompts.yaml overriding the built-in prompts
    #[arg(long, value_name = "DIR", global = true, env = "QUICKREAD_PROMPTS_DIR")]
    prompts_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one task and print the result (text on the command line counts as a selection)
    Run(RunArgs),
    /// Print how a text would be split for a given limit (JSON)
    Chunk(ChunkArgs),
    /// Print the input limit of a model (all actions as JSON, or one number with --action)
    Limits(LimitsArgs),
    /// Run each input line as a task in one session, then print the result history (JSON)
    History(HistoryArgs),
}

#[derive(ClapArgs, Debug, Clone)]
struct TaskFlags {
    /// summarize, translate, noTextCustom or textCustom (default: from settings)
    #[arg(short, long, value_name = "ACTION")]
    action: Option<ActionType>,
    /// text, image (data URL), captions or ad
    #[arg(long, value_name = "MEDIA")]
    media: Option<MediaType>,
    /// Model alias, e.g. 2.0-flash, 1.5-pro, or zz for the configured model id
    #[arg(short, long, value_name = "ALIAS")]
    model: Option<String>,
    /// Target language code, e.g. en, ja, zh_cn, or zz for the configured language
    #[arg(short, long, value_name = "CODE")]
    lang: Option<String>,
    /// Stream partial text (default: from settings)
    #[arg(long)]
    stream: bool,
    /// Do not reuse cached results
    #[arg(long)]
    no_cache: bool,
    /// Read input from this file instead of arguments or stdin
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,
}

impl TaskFlags {
    fn task_args(&self) -> TaskArgs {
        TaskArgs {
            action: self.action,
            media: self.media,
            model: self.model.clone(),
            lang: self.lang.clone(),
        }
    }

    fn options(&self) -> TaskOptions {
        TaskOptions {
            use_cache: !self.no_cache,
            streaming: self.stream.then_some(true),
        }
    }
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    #[command(flatten)]
    task: TaskFlags,
    /// Print the final report as JSON instead of streaming text
    #[arg(long)]
    json: bool,
    /// Input text (stdin when neither TEXT nor --file is given)
    #[arg(trailing_var_arg = true, value_name = "TEXT")]
    text: Vec<String>,
}

#[derive(ClapArgs, Debug)]
struct ChunkArgs {
    /// Maximum characters per chunk
    #[arg(long, value_name = "N")]
    max_chars: usize,
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,
    #[arg(trailing_var_arg = true, value_name = "TEXT")]
    text: Vec<String>,
}

#[derive(ClapArgs, Debug)]
struct LimitsArgs {
    /// Model alias or id
    model: String,
    #[arg(short, long, value_name = "ACTION")]
    action: Option<ActionType>,
}

#[derive(ClapArgs, Debug)]
struct HistoryArgs {
    #[command(flatten)]
    task: TaskFlags,
}

/// Cancels `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted; cancelling task");
            token.cancel();
        }
    });
}

async fn run(args: Args) -> Result<(), CliError> {
    let prompts_dir = args.prompts_dir.as_deref();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    match args.cmd {
        Command::Chunk(a) => {
            let (text, _) = read_input(&a.text, a.file.as_deref())?;
            chunk_command(&text, a.max_chars, &mut stdout)
        }
        Command::Limits(a) => {
            let qr = QuickRead::from_env(prompts_dir)?;
            limits_command(&qr, &a.model, a.action, &mut stdout).await
        }
        Command::Run(a) => {
            let qr = QuickRead::from_env(prompts_dir)?;
            let (input, source) = read_input(&a.text, a.task.file.as_deref())?;
            let settings = qr.settings().await;
            let request = build_request(&settings, &a.task.task_args(), input, source);
            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());
            run_command(
                &qr,
                request,
                a.task.options(),
                cancel,
                a.json,
                &mut stdout,
                &mut stderr,
            )
            .await
            .map(|_| ())
        }
        Command::History(a) => {
            let qr = QuickRead::from_env(prompts_dir)?;
            let (input, _) = read_input(&[], a.task.file.as_deref())?;
            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());
            history_command(
                &qr,
                &a.task.task_args(),
                &input,
                a.task.options(),
                cancel,
                &mut stdout,
            )
            .await
        }
    }
}

#[tokio::main]
async fn main() {
    config::load_and_apply("quickread", None::<&std::path::Path>).ok();
    let _log_guard = match logging::init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("quickread: log file: {}", e);
            None
        }
    };

    let args = Args::parse();
    if let Err(e) = run(args).await {
        // Task outcomes were already printed by the command.
        if !matches!(e, CliError::TaskFailed(_)) {
            eprintln!("{}", e);
        }
        std::process::exit(1);
    }
}
