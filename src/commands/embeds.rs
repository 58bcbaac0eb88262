use poise::serenity_prelude::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter};

use crate::osu::metrics::ScoreMetrics;
use crate::osu::score::Ruleset;
use crate::osu_api::{RawScore, RawUser, OSU_URL};

const OSU_PINK: u32 = 0xff66aa;

// {{{ Helpers
/// A plain embed with a title and a message.
pub fn notice(title: &str, description: impl Into<String>) -> CreateEmbed {
	CreateEmbed::default()
		.title(title)
		.description(description)
		.color(OSU_PINK)
}

#[inline]
pub fn profile_url(osu_user_id: u32) -> String {
	format!("{OSU_URL}/users/{osu_user_id}")
}

fn display_pp(pp: Option<f64>) -> String {
	match pp {
		Some(pp) => format!("{pp:.2}"),
		None => "-".to_owned(),
	}
}

fn title_of(score: &RawScore) -> String {
	let version = score
		.beatmap
		.as_ref()
		.map(|b| b.version.as_str())
		.unwrap_or("?");

	match &score.beatmapset {
		Some(set) => format!("{} - {} [{}]", set.artist, set.title, version),
		None => format!("Beatmap {} [{}]", score.beatmap_id.unwrap_or_default(), version),
	}
}

fn mods_suffix(score: &RawScore) -> String {
	let mods = score.record().mods;
	if mods.is_empty() {
		String::new()
	} else {
		format!(" +{mods}")
	}
}
// }}}
// {{{ Score card
pub fn score_card(user: &RawUser, score: &RawScore, metrics: Option<&ScoreMetrics>) -> CreateEmbed {
	let record = score.record();
	let stats = score.statistics;

	let mut embed = CreateEmbed::default()
		.title(title_of(score))
		.author(
			CreateEmbedAuthor::new(&user.username)
				.url(profile_url(user.id))
				.icon_url(&user.avatar_url),
		)
		.color(OSU_PINK)
		.field(
			"Judgements",
			format!("[{}/{}/{}/{}]", stats.great, stats.ok, stats.meh, stats.miss),
			true,
		);

	if record.beatmap_id != 0 {
		embed = embed.url(format!("{OSU_URL}/b/{}", record.beatmap_id));
	}

	if let Some(cover) = score
		.beatmapset
		.as_ref()
		.and_then(|s| s.covers.as_ref())
		.and_then(|c| c.list.as_ref())
	{
		embed = embed.thumbnail(cover);
	}

	let mut footer = format!("Rank {}", score.rank);
	if !score.passed {
		footer.push_str(" (failed)");
	}
	if let Some(ended_at) = &score.ended_at {
		footer.push_str(&format!(" • {ended_at}"));
	}
	embed = embed.footer(CreateEmbedFooter::new(footer));

	let Some(metrics) = metrics else {
		return embed
			.description(format!("{}{}", score.ruleset(), mods_suffix(score)))
			.field("PP", display_pp(score.pp), true)
			.field("Accuracy", format!("{:.2}%", score.accuracy * 100.0), true)
			.field("Combo", format!("{}x", score.max_combo), true);
	};

	let combo = match metrics.max_combo {
		Some(max) => format!("{}x / {max}x", score.max_combo),
		None => format!("{}x", score.max_combo),
	};

	let mut map = vec![];
	if let Some(cs) = metrics.metadata.circle_size {
		map.push(format!("CS {cs}"));
	}
	if let Some(ar) = metrics.metadata.approach_rate {
		map.push(format!("AR {ar}"));
	}
	if let Some(od) = metrics.metadata.overall_difficulty {
		map.push(format!("OD {od}"));
	}
	if let Some(hp) = metrics.metadata.drain_rate {
		map.push(format!("HP {hp}"));
	}
	if let Some(bpm) = metrics.metadata.bpm {
		map.push(format!("{bpm:.0} BPM"));
	}
	if let Some(length) = metrics.metadata.display_length() {
		map.push(length);
	}

	embed = embed
		.description(format!(
			"★ {:.2}{} • {}",
			metrics.stars_with_mods,
			mods_suffix(score),
			score.ruleset()
		))
		.field(
			"PP",
			format!(
				"**{}** • {} if FC • {} if SS",
				display_pp(metrics.actual_pp.or(score.pp)),
				display_pp(metrics.pp_if_full_combo),
				display_pp(metrics.pp_if_perfect)
			),
			false,
		)
		.field(
			"Accuracy",
			format!(
				"{:.2}% ({:.2}% if FC)",
				score.accuracy * 100.0,
				metrics.accuracy_if_full_combo
			),
			true,
		)
		.field("Combo", combo, true);

	if !map.is_empty() {
		embed = embed.field("Map", map.join(" • "), false);
	}

	embed
}
// }}}
// {{{ Top plays
pub fn top_listing(user: &RawUser, scores: &[RawScore]) -> CreateEmbed {
	let lines = scores
		.iter()
		.enumerate()
		.map(|(i, score)| {
			format!(
				"**#{}** {}{}\n{}pp • {:.2}% • {}x • {}",
				i + 1,
				title_of(score),
				mods_suffix(score),
				display_pp(score.pp),
				score.accuracy * 100.0,
				score.max_combo,
				score.rank,
			)
		})
		.collect::<Vec<_>>();

	CreateEmbed::default()
		.title(format!("Top plays of {}", user.username))
		.url(profile_url(user.id))
		.color(OSU_PINK)
		.thumbnail(&user.avatar_url)
		.description(lines.join("\n"))
}
// }}}
// {{{ Profile card
pub fn profile_card(user: &RawUser, mode: Option<Ruleset>) -> CreateEmbed {
	let mode = mode.or(user.playmode).unwrap_or_default();
	let mut embed = CreateEmbed::default()
		.title(format!("{} ({mode})", user.username))
		.url(profile_url(user.id))
		.color(OSU_PINK)
		.thumbnail(&user.avatar_url);

	let Some(stats) = &user.statistics else {
		return embed.description("This user has not played this mode yet.");
	};

	let rank = |rank: Option<u32>| match rank {
		Some(rank) => format!("#{rank}"),
		None => "-".to_owned(),
	};

	embed = embed
		.field("PP", format!("{:.2}", stats.pp), true)
		.field("Global rank", rank(stats.global_rank), true)
		.field(
			format!("Country rank ({})", user.country_code),
			rank(stats.country_rank),
			true,
		)
		.field("Accuracy", format!("{:.2}%", stats.hit_accuracy), true)
		.field("Play count", format!("{}", stats.play_count), true)
		.field("Max combo", format!("{}x", stats.maximum_combo), true);

	if let Some(level) = &stats.level {
		embed = embed.field("Level", format!("{}.{:02}", level.current, level.progress), true);
	}

	if let Some(seconds) = stats.play_time {
		embed = embed.field("Play time", format!("{}h", seconds / 3600), true);
	}

	embed
}
// }}}
