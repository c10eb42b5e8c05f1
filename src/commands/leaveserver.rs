use crate::utils::is_protected_user;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use serenity::GuildId;

const NO_SERVER_REPLY: &str = "❌ No server found. Please provide a valid server id.";

fn leave_reply(name: &str, success: bool) -> String {
    if success {
        format!("✅ Successfully left `{name}`")
    } else {
        format!("❌ Failed to leave `{name}`")
    }
}

/// Make the bot leave a server by its id (owner only)
#[poise::command(prefix_command, slash_command, category = "Owner")]
pub async fn leaveserver(
    ctx: Context<'_>,
    #[description = "ID of the server to leave"] server_id: String,
) -> Result<(), Error> {
    log::info!(
        "Leaveserver command called by {} for '{}'",
        ctx.author().name,
        server_id
    );

    // Check if the user is authorized
    if !is_protected_user(&ctx.author().name) {
        ctx.say("❌ You don't have permission to use this command!")
            .await?;
        return Ok(());
    }

    let guild_id = match server_id.trim().parse::<u64>() {
        Ok(id) if id != 0 => GuildId::new(id),
        _ => {
            ctx.say(NO_SERVER_REPLY).await?;
            return Ok(());
        }
    };

    // Clone the name out of the cache before the first await
    let name = ctx
        .serenity_context()
        .cache
        .guild(guild_id)
        .map(|guild| guild.name.clone());

    let Some(name) = name else {
        ctx.say(NO_SERVER_REPLY).await?;
        return Ok(());
    };

    match guild_id.leave(ctx.http()).await {
        Ok(()) => {
            ctx.say(leave_reply(&name, true)).await?;
        }
        Err(e) => {
            log::error!("Failed to leave guild {guild_id}: {e}");
            ctx.say(leave_reply(&name, false)).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_shapes() {
        assert_eq!(
            NO_SERVER_REPLY,
            "❌ No server found. Please provide a valid server id."
        );
        assert_eq!(
            leave_reply("City Guild", true),
            "✅ Successfully left `City Guild`"
        );
        assert_eq!(
            leave_reply("City Guild", false),
            "❌ Failed to leave `City Guild`"
        );
    }

    #[test]
    fn test_server_id_parsing() {
        assert!(matches!(" 123456789 ".trim().parse::<u64>(), Ok(123456789)));
        assert!("not-an-id".trim().parse::<u64>().is_err());
        assert!("".trim().parse::<u64>().is_err());
    }

    #[test]
    fn test_zero_id_is_rejected() {
        // GuildId::new panics on zero, the command treats it as not found
        let parsed = "0".parse::<u64>();
        assert!(matches!(parsed, Ok(0)));
    }
}
