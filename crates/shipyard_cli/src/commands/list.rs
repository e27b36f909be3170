//! List command - Show what generation would produce.

use anyhow::Result;
use clap::Args;
use shipyard_deploy::ResourceSummary;

use super::Context;

#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn execute(args: ListArgs, context: &Context) -> Result<()> {
    let project = context.open_project()?;
    let summary =
        project
            .generator
            .list_resources(project.file.config(), &project.file, &project.file);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &ResourceSummary) {
    println!("📋 Ingress routes ({})", summary.ingress.count);
    for route in &summary.ingress.routes {
        println!(
            "   {:<7} {:<30} {:<8} {}",
            route.method, route.path, route.path_type, route.handler
        );
    }

    println!();
    println!("📋 Daemons ({})", summary.daemon.count);
    for command in &summary.daemon.commands {
        println!(
            "   {:<30} x{}  {}",
            command.resource_name, command.replicas, command.description
        );
    }

    println!();
    println!("📋 CronJobs ({})", summary.cronjob.count);
    for command in &summary.cronjob.commands {
        println!(
            "   {:<30} {:<15} {}",
            command.resource_name,
            command.schedule.as_deref().unwrap_or("-"),
            command.description
        );
    }
}
