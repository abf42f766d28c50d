use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct SchemaArgs {
    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

pub fn run(args: SchemaArgs) -> Result<()> {
    let schema = ida_resolver::config_schema_json();
    if args.compact {
        println!("{}", serde_json::to_string(&schema)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&schema)?);
    }
    Ok(())
}
