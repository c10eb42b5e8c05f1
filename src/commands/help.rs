use std::collections::BTreeMap;

use crate::category;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;

/// Shows all available commands, grouped by category
///
/// # Usage
/// - `-help` or `/help` - Show all commands grouped by category
/// - `-help category_name` - Show a single category with its artwork
#[poise::command(prefix_command, slash_command, category = "Information")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Specific category to show"] category: Option<String>,
) -> Result<(), Error> {
    log::info!("Help command called by {}", ctx.author().name);

    let grouped = group_commands(
        ctx.framework()
            .options
            .commands
            .iter()
            .map(|command| CommandSummary {
                name: command.name.clone(),
                category: command.category.clone(),
                description: command.description.clone(),
                hidden: command.hide_in_help,
            }),
    );

    match category {
        Some(name) => show_category(ctx, &grouped, &name).await,
        None => show_all(ctx, &grouped).await,
    }
}

struct CommandSummary {
    name: String,
    category: Option<String>,
    description: Option<String>,
    hidden: bool,
}

/// Group visible commands into category -> listing lines. Commands without
/// a category land under Utility.
fn group_commands(
    commands: impl Iterator<Item = CommandSummary>,
) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for command in commands {
        if command.hidden {
            continue;
        }
        let category = command.category.unwrap_or_else(|| "Utility".to_string());
        if category::find(&category).is_some_and(|meta| !meta.enabled) {
            continue;
        }
        let description = command
            .description
            .unwrap_or_else(|| "No description".to_string());
        grouped
            .entry(category)
            .or_default()
            .push(format!("• `-{}` - {}", command.name, description));
    }
    grouped
}

fn category_heading(name: &str) -> String {
    match category::find(name) {
        Some(meta) => format!("{} {}", meta.emoji, meta.name),
        None => name.to_string(),
    }
}

async fn show_all(ctx: Context<'_>, grouped: &BTreeMap<String, Vec<String>>) -> Result<(), Error> {
    let mut embed = serenity::CreateEmbed::new()
        .title("🤖 Bot Help - Available Commands")
        .description("Use `-help <category>` for a single category.")
        .color(0x7289DA);

    for (category, lines) in grouped {
        embed = embed.field(category_heading(category), lines.join("\n"), false);
    }

    embed = embed
        .footer(serenity::CreateEmbedFooter::new(
            "Commands work with both prefix (-) and slash (/) formats",
        ))
        .timestamp(serenity::Timestamp::now());

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

async fn show_category(
    ctx: Context<'_>,
    grouped: &BTreeMap<String, Vec<String>>,
    name: &str,
) -> Result<(), Error> {
    let Some((category, lines)) = grouped
        .iter()
        .find(|(category, _)| category.eq_ignore_ascii_case(name))
    else {
        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "❌ Category `{name}` not found. Use `-help` to see all categories."
                ))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    let mut embed = serenity::CreateEmbed::new()
        .title(category_heading(category))
        .description(lines.join("\n"))
        .color(0x7289DA)
        .timestamp(serenity::Timestamp::now());

    if let Some(meta) = category::find(category) {
        embed = embed.thumbnail(meta.image);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(name: &str, category: Option<&str>, hidden: bool) -> CommandSummary {
        CommandSummary {
            name: name.to_string(),
            category: category.map(str::to_string),
            description: Some(format!("{name} description")),
            hidden,
        }
    }

    #[test]
    fn test_group_commands_by_category() {
        let grouped = group_commands(
            vec![
                command("leaveserver", Some("Owner"), false),
                command("help", Some("Information"), false),
                command("secret", Some("Owner"), true),
            ]
            .into_iter(),
        );

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["Owner"].len(), 1);
        assert!(grouped["Owner"][0].contains("`-leaveserver`"));
        assert!(grouped["Information"][0].contains("`-help`"));
    }

    #[test]
    fn test_uncategorized_commands_land_in_utility() {
        let grouped = group_commands(vec![command("ping", None, false)].into_iter());
        assert!(grouped.contains_key("Utility"));
    }

    #[test]
    fn test_category_heading_uses_registry_emoji() {
        assert_eq!(category_heading("Owner"), "🤴 Owner");
        assert_eq!(category_heading("Mystery"), "Mystery");
    }
}
