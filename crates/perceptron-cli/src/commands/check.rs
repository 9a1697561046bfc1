use crate::cli::CheckArgs;
use crate::error::{CliError, Result};
use perceptron::core::io::knowledge;
use perceptron::core::situation::SituationBase;
use std::fmt::Write as _;
use tracing::info;

pub fn run(args: CheckArgs) -> Result<()> {
    let base = knowledge::load_situation_base(&args.knowledge_base)?;
    print!("{}", render_base(&base, args.details));

    if let Some(path) = &args.channels {
        let definitions = knowledge::load_channel_definitions(path)?;
        for (index, definition) in definitions.iter().enumerate() {
            definition.validate().map_err(|source| CliError::Channel {
                path: path.clone(),
                index: index + 1,
                source,
            })?;
        }
        info!(path = %path.display(), count = definitions.len(), "Channel definitions parsed.");
        println!(
            "✓ {} channel definition(s) in {}",
            definitions.len(),
            path.display()
        );
    }
    Ok(())
}

fn render_base(base: &SituationBase, details: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "✓ {} situation(s) loaded.", base.situation_count());
    for situation in base.situations() {
        let _ = writeln!(out, "  {}", situation);
        if !details {
            continue;
        }
        for circumstance in &situation.circumstances {
            let _ = writeln!(out, "      {}", circumstance);
        }
        if let Some(expression) = &situation.logical_expression {
            let _ = writeln!(out, "      expression: {}", expression);
        }
        if let Some(reaction) = situation.reaction {
            let _ = writeln!(out, "      reaction: {}", reaction);
        }
    }
    out
}
