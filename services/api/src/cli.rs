use crate::demo::{run_demo, DemoArgs};
use crate::server;
use breastcare_intake::error::AppError;
use breastcare_intake::workflows::assessment::{QuestionCatalog, QuestionDefinition, QuestionKind};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "BreastCare Assessment API",
    about = "Serve and demonstrate the breast cancer risk intake questionnaire",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the questionnaire catalog
    Questions(QuestionsArgs),
    /// Walk the questionnaire with scripted answers and a scripted scoring backend
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Score with the in-process scripted backend instead of BREASTCARE_API_URL
    #[arg(long)]
    pub(crate) scripted_backend: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct QuestionsArgs {
    /// Emit the catalog as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Questions(args) => {
            let listing = render_questions(&QuestionCatalog::breast_cancer_risk(), args.json)?;
            println!("{listing}");
            Ok(())
        }
        Command::Demo(args) => run_demo(args).await,
    }
}

fn render_questions(catalog: &QuestionCatalog, json: bool) -> Result<String, AppError> {
    if json {
        return Ok(serde_json::to_string_pretty(catalog.questions())?);
    }

    let mut lines = vec![format!("{} questions", catalog.len())];
    for (index, question) in catalog.questions().iter().enumerate() {
        lines.push(describe_question(index + 1, question));
    }
    Ok(lines.join("\n"))
}

fn describe_question(number: usize, question: &QuestionDefinition) -> String {
    let mut lines = vec![format!(
        "{number:>2}. [{:?}] {} ({})",
        question.section, question.prompt, question.id
    )];

    match &question.kind {
        QuestionKind::Number { format } => {
            let unit = question
                .unit
                .map(|unit| format!(" {}", unit.symbol()))
                .unwrap_or_default();
            let range = question
                .bounds
                .map(|bounds| format!(", {}-{}", bounds.min, bounds.max))
                .unwrap_or_default();
            lines.push(format!("    number ({format:?}{range}){unit}"));
        }
        QuestionKind::Boolean => lines.push("    oui / non".to_string()),
        QuestionKind::SingleSelect { options } => {
            for option in options {
                lines.push(format!("    - {}", option.label));
            }
        }
    }

    if let Some(dependency) = &question.depends_on {
        lines.push(format!(
            "    shown when '{}' {:?}",
            dependency.question_id, dependency.predicate
        ));
    }

    lines.join("\n")
}
