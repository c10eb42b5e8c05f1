use std::time::Duration;

use poise::serenity_prelude as serenity;
use serenity::{
    ActionRow, ActionRowComponent, ButtonStyle, ChannelId, CreateActionRow, CreateButton,
    CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateInputText, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage, CreateModal, EditMember, GuildId,
    InputTextStyle, Member, ReactionType, RoleId, User, UserId,
};

use crate::settings::{GreetingConfig, Settings};
use crate::utils::best_effort;

/// Every interactive wait in the verification workflow uses the same limit.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(20 * 60);
const TIMEOUT_KICK_REASON: &str = "Still not verified after 20 minutes";

const VERIFY_BUTTON_ID: &str = "welcome";
const VERIFY_MODAL_ID: &str = "welcome-modal";
const GROWID_INPUT_ID: &str = "growid";
const CONFIRM_BUTTON_ID: &str = "member-confirm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreetingKind {
    Welcome,
    Farewell,
}

/// Read-only snapshot of a member, taken when the event arrives so the
/// template renderer never has to touch the cache or the gateway again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberProfile {
    pub id: u64,
    pub username: String,
    pub discriminator: Option<u16>,
    pub display_name: String,
    pub avatar_url: String,
    pub is_bot: bool,
    pub guild_name: String,
    pub member_count: u64,
}

impl MemberProfile {
    pub fn from_member(ctx: &serenity::Context, member: &Member) -> Self {
        let (guild_name, member_count) = guild_facts(ctx, member.guild_id);
        MemberProfile {
            id: member.user.id.get(),
            username: member.user.name.clone(),
            discriminator: member.user.discriminator.map(|d| d.get()),
            display_name: member
                .nick
                .clone()
                .or_else(|| member.user.global_name.clone())
                .unwrap_or_else(|| member.user.name.clone()),
            avatar_url: member
                .user
                .avatar_url()
                .unwrap_or_else(|| member.user.default_avatar_url()),
            is_bot: member.user.bot,
            guild_name,
            member_count,
        }
    }

    /// Built from a bare `User` for farewell events, where the member record
    /// is already gone.
    pub fn from_user(ctx: &serenity::Context, guild_id: GuildId, user: &User) -> Self {
        let (guild_name, member_count) = guild_facts(ctx, guild_id);
        MemberProfile {
            id: user.id.get(),
            username: user.name.clone(),
            discriminator: user.discriminator.map(|d| d.get()),
            display_name: user
                .global_name
                .clone()
                .unwrap_or_else(|| user.name.clone()),
            avatar_url: user
                .avatar_url()
                .unwrap_or_else(|| user.default_avatar_url()),
            is_bot: user.bot,
            guild_name,
            member_count,
        }
    }

    /// `username#0001` style tag, or the bare username for accounts without
    /// a discriminator.
    pub fn tag(&self) -> String {
        match self.discriminator {
            Some(d) => format!("{}#{:04}", self.username, d),
            None => self.username.clone(),
        }
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

fn guild_facts(ctx: &serenity::Context, guild_id: GuildId) -> (String, u64) {
    match ctx.cache.guild(guild_id) {
        Some(guild) => (guild.name.clone(), guild.member_count),
        None => {
            log::warn!("Guild {guild_id} is not cached, {{server}} and {{count}} render empty");
            (String::new(), 0)
        }
    }
}

/// Who invited the joining member, as computed by the invite tracker.
#[derive(Debug, Clone, Default)]
pub struct InviterData {
    /// Id of the inviting account, or a marker such as `VANITY` when the
    /// join came through a vanity URL. `None` when nothing is known.
    pub member_id: Option<String>,
    pub invites: Option<InviteCounters>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InviteCounters {
    pub tracked: i64,
    pub added: i64,
    pub fake: i64,
    pub left: i64,
}

fn effective_invites(counters: Option<InviteCounters>) -> i64 {
    counters
        .map(|c| c.tracked + c.added - c.fake - c.left)
        .unwrap_or(0)
}

/// Resolve the inviter name/tag pair without a network round trip when the
/// id is not a real account. Returns `None` when an account fetch is needed.
fn inviter_shortcut(inviter_id: &str, member_is_bot: bool) -> Option<(String, String)> {
    if inviter_id != "VANITY" && inviter_id != "NA" {
        return None;
    }
    if member_is_bot {
        // Bots join through OAuth, there is no inviter account
        Some(("OAuth".to_string(), "OAuth".to_string()))
    } else {
        Some((inviter_id.to_string(), inviter_id.to_string()))
    }
}

async fn resolve_inviter(
    http: &serenity::Http,
    inviter_id: &str,
    member_is_bot: bool,
) -> (String, String) {
    if let Some(resolved) = inviter_shortcut(inviter_id, member_is_bot) {
        return resolved;
    }

    let not_applicable = || ("NA".to_string(), "NA".to_string());
    match inviter_id.parse::<u64>() {
        Ok(id) if id != 0 => match http.get_user(UserId::new(id)).await {
            Ok(user) => {
                let tag = user.tag();
                (user.name, tag)
            }
            Err(e) => {
                log::warn!("Failed to resolve inviter {inviter_id}: {e}");
                not_applicable()
            }
        },
        _ => {
            log::warn!("Inviter id {inviter_id} is not a valid user id");
            not_applicable()
        }
    }
}

/// Substitution core: every recognized token is replaced unconditionally,
/// which is a no-op for tokens the template does not contain.
fn substitute(
    template: &str,
    profile: &MemberProfile,
    inviter_name: &str,
    inviter_tag: &str,
    invites: i64,
) -> String {
    let discriminator = profile
        .discriminator
        .map_or_else(|| "0".to_string(), |d| format!("{d:04}"));

    template
        .replace("\\n", "\n")
        .replace("{server}", &profile.guild_name)
        .replace("{count}", &profile.member_count.to_string())
        .replace("{member:nick}", &profile.display_name)
        .replace("{member:name}", &profile.username)
        .replace("{member:dis}", &discriminator)
        .replace("{member:tag}", &profile.tag())
        .replace("{member:mention}", &profile.mention())
        .replace("{member:avatar}", &profile.avatar_url)
        .replace("{inviter:name}", inviter_name)
        .replace("{inviter:tag}", inviter_tag)
        .replace("{invites}", &invites.to_string())
}

/// Expand a greeting template. The inviter lookup only happens when the
/// template actually mentions an `{inviter:*}` token; its failure is never
/// fatal, the substitution falls back to `NA`.
pub async fn parse(
    http: &serenity::Http,
    template: &str,
    profile: &MemberProfile,
    inviter: &InviterData,
) -> String {
    let (inviter_name, inviter_tag) = if template.contains("{inviter:") {
        let inviter_id = inviter.member_id.as_deref().unwrap_or("NA");
        resolve_inviter(http, inviter_id, profile.is_bot).await
    } else {
        (String::new(), String::new())
    };

    substitute(
        template,
        profile,
        &inviter_name,
        &inviter_tag,
        effective_invites(inviter.invites),
    )
}

/// A greeting ready to send: plain text, optional embed, and (welcome only)
/// the verification button.
#[derive(Debug, Default)]
pub struct RenderedGreeting {
    pub content: Option<String>,
    pub embed: Option<CreateEmbed>,
    pub verify_button: bool,
}

impl RenderedGreeting {
    pub fn into_message(self) -> CreateMessage {
        let mut message = CreateMessage::new();
        if let Some(content) = self.content {
            message = message.content(content);
        }
        if let Some(embed) = self.embed {
            message = message.embed(embed);
        }
        if self.verify_button {
            message = message.components(vec![CreateActionRow::Buttons(vec![CreateButton::new(
                VERIFY_BUTTON_ID,
            )
            .label("Verify")
            .style(ButtonStyle::Primary)])]);
        }
        message
    }
}

/// Build the greeting payload for one event. Returns `None` when no config
/// exists for the event type, in which case the caller must not send
/// anything. `can_verify` says whether a verification workflow can actually
/// start; without it the Verify button would be a dead control.
pub async fn build_greeting(
    http: &serenity::Http,
    profile: &MemberProfile,
    kind: GreetingKind,
    config: Option<&GreetingConfig>,
    inviter: &InviterData,
    can_verify: bool,
) -> Option<RenderedGreeting> {
    let config = config?;

    // Nothing configured at all: fall back to a plain default line, with no
    // embed and no button.
    if config.content.is_none()
        && config.embed.description.is_none()
        && config.embed.footer.is_none()
    {
        let fallback = match kind {
            GreetingKind::Welcome => {
                format!("Welcome to the server, {} 🎉", profile.display_name)
            }
            GreetingKind::Farewell => format!("{} has left the server 👋", profile.username),
        };
        return Some(RenderedGreeting {
            content: Some(fallback),
            ..Default::default()
        });
    }

    let mut content = None;
    if let Some(template) = &config.content {
        content = Some(parse(http, template, profile, inviter).await);
    }

    let mut embed = CreateEmbed::new();
    let mut has_embed = false;
    if let Some(description) = &config.embed.description {
        embed = embed.description(parse(http, description, profile, inviter).await);
        has_embed = true;
    }
    if let Some(color) = config.embed.color {
        embed = embed.color(color);
        has_embed = true;
    }
    if config.embed.thumbnail {
        embed = embed.thumbnail(profile.avatar_url.clone());
        has_embed = true;
    }
    if let Some(footer) = &config.embed.footer {
        embed = embed.footer(CreateEmbedFooter::new(
            parse(http, footer, profile, inviter).await,
        ));
        has_embed = true;
    }
    if let Some(image) = &config.embed.image {
        embed = embed.image(parse(http, image, profile, inviter).await);
        has_embed = true;
    }

    Some(RenderedGreeting {
        content,
        embed: has_embed.then_some(embed),
        // The button belongs to the welcome flow only, and only on
        // payloads that actually carry rich content.
        verify_button: kind == GreetingKind::Welcome && has_embed && can_verify,
    })
}

fn first_text_input(rows: &[ActionRow], custom_id: &str) -> Option<String> {
    rows.iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == custom_id => {
                input.value.clone()
            }
            _ => None,
        })
}

/// Channel from the greeting config, only if the guild actually has it.
fn existing_channel(
    ctx: &serenity::Context,
    guild_id: GuildId,
    channel: Option<u64>,
) -> Option<ChannelId> {
    let id = ChannelId::new(channel.filter(|&id| id != 0)?);
    let guild = ctx.cache.guild(guild_id)?;
    guild.channels.contains_key(&id).then_some(id)
}

/// Greet a joining member and walk them through verification.
///
/// The whole flow is one linear sequence: send the greeting, wait for the
/// Verify click, collect the GrowID through a modal, post a staff review
/// request, then apply roles and nickname. Each wait is bounded by
/// [`VERIFY_TIMEOUT`]; a member who never reacts before the modal step is
/// kicked, a member stuck waiting on staff just keeps the submitted name.
/// Nothing is persisted, a restart abandons any in-flight session.
pub async fn send_welcome(
    ctx: &serenity::Context,
    member: &Member,
    inviter: InviterData,
    settings: &Settings,
) {
    let guild_id = member.guild_id;
    let Some(guild_settings) = settings.guild(guild_id.get()) else {
        return;
    };
    let Some(config) = guild_settings.welcome.as_ref().filter(|c| c.is_active()) else {
        return;
    };
    let Some(channel) = existing_channel(ctx, guild_id, config.channel) else {
        return;
    };

    let profile = MemberProfile::from_member(ctx, member);
    let Some(response) = build_greeting(
        &ctx.http,
        &profile,
        GreetingKind::Welcome,
        Some(config),
        &inviter,
        guild_settings.verification.is_some(),
    )
    .await
    else {
        return;
    };

    let sent = match channel.send_message(&ctx.http, response.into_message()).await {
        Ok(message) => message,
        Err(e) => {
            log::error!("Failed to send welcome message in guild {guild_id}: {e}");
            return;
        }
    };

    // Guilds without a verification block only get the greeting message.
    let Some(verification) = guild_settings.verification.as_ref() else {
        return;
    };

    let click = sent
        .await_component_interaction(&ctx.shard)
        .author_id(member.user.id)
        .custom_ids(vec![VERIFY_BUTTON_ID.to_string()])
        .timeout(VERIFY_TIMEOUT)
        .await;

    let Some(click) = click else {
        log::info!(
            "{} never pressed Verify in guild {guild_id}, removing them",
            profile.username
        );
        best_effort(
            "kicking unverified member",
            member.kick_with_reason(&ctx.http, TIMEOUT_KICK_REASON).await,
        );
        return;
    };

    let modal = CreateModal::new(VERIFY_MODAL_ID, "GrowID Verification").components(vec![
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "What is your GrowID?", GROWID_INPUT_ID)
                .required(true),
        ),
    ]);
    if let Err(e) = click
        .create_response(&ctx.http, CreateInteractionResponse::Modal(modal))
        .await
    {
        log::error!("Failed to show the verification modal: {e}");
        return;
    }

    let submission = sent
        .await_modal_interaction(&ctx.shard)
        .author_id(member.user.id)
        .custom_ids(vec![VERIFY_MODAL_ID.to_string()])
        .timeout(VERIFY_TIMEOUT)
        .await;

    let Some(submission) = submission else {
        log::info!(
            "{} never submitted a GrowID in guild {guild_id}, removing them",
            profile.username
        );
        best_effort(
            "kicking unverified member",
            member.kick_with_reason(&ctx.http, TIMEOUT_KICK_REASON).await,
        );
        return;
    };

    best_effort(
        "acknowledging the GrowID submission",
        submission
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content("Please wait for a review from our server administrator.")
                        .ephemeral(true),
                ),
            )
            .await,
    );

    let Some(growid) = first_text_input(&submission.data.components, GROWID_INPUT_ID) else {
        log::error!("GrowID modal submission carried no text value");
        return;
    };

    let review_embed = CreateEmbed::new()
        .color(0xDDDDDD)
        .author(CreateEmbedAuthor::new("Verification Request"))
        .thumbnail(profile.avatar_url.clone())
        .description(
            "If the GrowID belongs to one of the guild members then\npress 🏙️, otherwise leave it.",
        )
        .field("Requested by", profile.mention(), true)
        .field("GrowID", growid.clone(), true)
        .timestamp(chrono::Utc::now());

    let confirm_row = CreateActionRow::Buttons(vec![CreateButton::new(CONFIRM_BUTTON_ID)
        .emoji(ReactionType::Unicode("🏙️".to_string()))
        .style(ButtonStyle::Secondary)]);

    let review_channel = ChannelId::new(verification.review_channel);
    let review = match review_channel
        .send_message(
            &ctx.http,
            CreateMessage::new()
                .content(format!("<@&{}>", verification.mention_role))
                .embed(review_embed)
                .components(vec![confirm_row]),
        )
        .await
    {
        Ok(message) => message,
        Err(e) => {
            log::error!(
                "Failed to post the verification request for {}: {e}",
                profile.username
            );
            return;
        }
    };

    let confirmation = review
        .await_component_interaction(&ctx.shard)
        .custom_ids(vec![CONFIRM_BUTTON_ID.to_string()])
        .timeout(VERIFY_TIMEOUT)
        .await;

    let Some(confirmation) = confirmation else {
        // Staff never reacted: keep the member around under the name they
        // submitted, without any role change.
        log::info!(
            "No staff confirmation for {}, they stay unverified as {growid}",
            profile.username
        );
        best_effort(
            "setting nickname",
            guild_id
                .edit_member(
                    &ctx.http,
                    member.user.id,
                    EditMember::new().nickname(growid.clone()),
                )
                .await,
        );
        return;
    };

    best_effort(
        "acknowledging the staff confirmation",
        confirmation
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content(format!(
                            "{} is now confirmed as <@&{}>.",
                            profile.mention(),
                            verification.verified_role
                        ))
                        .ephemeral(true),
                ),
            )
            .await,
    );

    best_effort(
        "granting the verified role",
        member
            .add_role(&ctx.http, RoleId::new(verification.verified_role))
            .await,
    );
    best_effort(
        "revoking the unverified role",
        member
            .remove_role(&ctx.http, RoleId::new(verification.unverified_role))
            .await,
    );
    best_effort(
        "setting nickname",
        guild_id
            .edit_member(
                &ctx.http,
                member.user.id,
                EditMember::new().nickname(growid.clone()),
            )
            .await,
    );

    log::info!("{} verified as {growid} in guild {guild_id}", profile.username);
}

/// Say goodbye to a leaving member. One-shot: build, send, done.
pub async fn send_farewell(
    ctx: &serenity::Context,
    guild_id: GuildId,
    user: &User,
    settings: &Settings,
) {
    let Some(guild_settings) = settings.guild(guild_id.get()) else {
        return;
    };
    let Some(config) = guild_settings.farewell.as_ref().filter(|c| c.is_active()) else {
        return;
    };
    let Some(channel) = existing_channel(ctx, guild_id, config.channel) else {
        return;
    };

    let profile = MemberProfile::from_user(ctx, guild_id, user);
    let Some(response) = build_greeting(
        &ctx.http,
        &profile,
        GreetingKind::Farewell,
        Some(config),
        &InviterData::default(),
        false,
    )
    .await
    else {
        return;
    };

    if let Err(e) = channel.send_message(&ctx.http, response.into_message()).await {
        log::error!("Failed to send farewell message in guild {guild_id}: {e}");
    }
}
