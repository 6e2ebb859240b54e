//! `streamcord preview`: render the desired state without touching Discord.

use tabled::Tabled;

use streamcord_core::{CycleInputs, DesiredResource, build_desired, poller::gather_inputs, source};

use crate::cli::{GlobalOpts, PreviewArgs};
use crate::commands::{config_err, load};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Content")]
    content: String,
}

fn to_row(r: &DesiredResource) -> ResourceRow {
    ResourceRow {
        kind: r.kind.to_string(),
        key: r.key.to_string(),
        content: r.content.clone(),
    }
}

pub async fn handle(args: PreviewArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (config, path) = load(global)?;
    let upstream = config.upstream().map_err(config_err(&path))?;
    let poll = config.poll().map_err(config_err(&path))?;
    let display = config.display;

    let source = source::connect(&upstream)?;
    let inputs: CycleInputs = gather_inputs(source.as_ref(), &display, &poll).await?;
    let desired = build_desired(&inputs, &display);

    let out = output::render_list(args.output, &desired, to_row)?;
    output::print_output(&out);
    Ok(())
}
