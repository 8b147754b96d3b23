//! Provider-side length limits for webhook messages.
//!
//! Limits are counted in characters. Everything sent through
//! [`crate::adapters::webhook::WebhookClient`] is expected to pass through
//! [`Embed::fit_to_limits`], [`Embed::fit_into_messages`] or
//! [`split_content`] first.

use super::{Embed, EmbedField};

pub const CONTENT_LIMIT: usize = 2000;
pub const TITLE_LIMIT: usize = 256;
pub const DESCRIPTION_LIMIT: usize = 4096;
pub const FIELD_NAME_LIMIT: usize = 256;
pub const FIELD_VALUE_LIMIT: usize = 1024;
pub const FOOTER_LIMIT: usize = 2048;
pub const MAX_FIELDS: usize = 25;
pub const EMBED_TOTAL_LIMIT: usize = 6000;

/// Zero-width name so continuation fields render as part of the previous one.
pub const CONTINUATION_NAME: &str = "\u{200B}\u{2060}";
pub const CONTINUATION_PREFIX: &str = "\u{00A0}\n";

const ELLIPSIS: char = '…';

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn truncate(text: &str, limit: usize) -> String {
    if char_len(text) <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(limit - 1).collect();
    out.push(ELLIPSIS);
    out
}

/// Greedily packs `pieces` joined by `joiner` into chunks of at most `limit`
/// characters. A piece that alone exceeds the limit is truncated.
pub fn pack(pieces: &[&str], joiner: &str, limit: usize) -> Vec<String> {
    let joiner_len = char_len(joiner);
    let mut chunks = Vec::new();
    let mut current: Option<(String, usize)> = None;

    for piece in pieces {
        let piece = truncate(piece, limit);
        let piece_len = char_len(&piece);

        current = match current.take() {
            None => Some((piece, piece_len)),
            Some((mut chunk, len)) if len + joiner_len + piece_len <= limit => {
                chunk.push_str(joiner);
                chunk.push_str(&piece);
                Some((chunk, len + joiner_len + piece_len))
            }
            Some((chunk, _)) => {
                chunks.push(chunk);
                Some((piece, piece_len))
            }
        };
    }

    if let Some((chunk, _)) = current {
        chunks.push(chunk);
    }
    chunks
}

fn chunks_to_fields(name: &str, chunks: Vec<String>, inline: bool) -> Vec<EmbedField> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            if i == 0 {
                EmbedField {
                    name: truncate(name, FIELD_NAME_LIMIT),
                    value: chunk,
                    inline,
                }
            } else {
                EmbedField {
                    name: CONTINUATION_NAME.to_string(),
                    value: format!("{}{}", CONTINUATION_PREFIX, chunk),
                    inline,
                }
            }
        })
        .collect()
}

fn continuation_budget() -> usize {
    FIELD_VALUE_LIMIT - char_len(CONTINUATION_PREFIX)
}

/// Splits a field whose value is over the limit on `separator` boundaries.
pub fn split_field(field: &EmbedField, separator: &str) -> Vec<EmbedField> {
    if char_len(&field.value) <= FIELD_VALUE_LIMIT {
        return vec![EmbedField {
            name: truncate(&field.name, FIELD_NAME_LIMIT),
            value: field.value.clone(),
            inline: field.inline,
        }];
    }

    let separator = if separator.is_empty() { "\n" } else { separator };
    let pieces: Vec<&str> = field.value.split(separator).collect();
    let chunks = pack(&pieces, separator, continuation_budget());
    chunks_to_fields(&field.name, chunks, field.inline)
}

/// Builds one or more fields from list entries without cutting an entry in half.
pub fn fields_from_entries(name: &str, entries: &[String], joiner: &str) -> Vec<EmbedField> {
    let joined = entries.join(joiner);
    if char_len(&joined) <= FIELD_VALUE_LIMIT {
        return vec![EmbedField::new(truncate(name, FIELD_NAME_LIMIT), joined)];
    }

    let pieces: Vec<&str> = entries.iter().map(String::as_str).collect();
    chunks_to_fields(name, pack(&pieces, joiner, continuation_budget()), false)
}

/// Splits plain message content into messages that each fit the content limit.
pub fn split_content(text: &str) -> Vec<String> {
    if char_len(text) <= CONTENT_LIMIT {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for line in text.split('\n') {
        if char_len(line) <= CONTENT_LIMIT {
            lines.push(line.to_string());
        } else {
            let chars: Vec<char> = line.chars().collect();
            lines.extend(chars.chunks(CONTENT_LIMIT).map(|c| c.iter().collect::<String>()));
        }
    }

    let pieces: Vec<&str> = lines.iter().map(String::as_str).collect();
    pack(&pieces, "\n", CONTENT_LIMIT)
}

impl Embed {
    pub fn total_chars(&self) -> usize {
        let title = self.title.as_deref().map(char_len).unwrap_or(0);
        let description = self.description.as_deref().map(char_len).unwrap_or(0);
        let footer = self.footer.as_ref().map(|f| char_len(&f.text)).unwrap_or(0);
        let fields: usize = self
            .fields
            .iter()
            .map(|f| char_len(&f.name) + char_len(&f.value))
            .sum();
        title + description + footer + fields
    }

    fn truncate_parts(&mut self, separator: &str) {
        self.title = self.title.take().map(|t| truncate(&t, TITLE_LIMIT));
        self.description = self.description.take().map(|d| truncate(&d, DESCRIPTION_LIMIT));
        if let Some(footer) = self.footer.as_mut() {
            footer.text = truncate(&footer.text, FOOTER_LIMIT);
        }

        let fields = std::mem::take(&mut self.fields);
        self.fields = fields
            .iter()
            .flat_map(|f| split_field(f, separator))
            .collect();
    }

    /// Same title and color, nothing else.
    fn continuation(&self) -> Embed {
        Embed {
            title: self.title.clone(),
            color: self.color,
            ..Default::default()
        }
    }

    /// Truncates and splits every part of the embed so the provider accepts it.
    /// Oversized field values are split on `separator`.
    pub fn fit_to_limits(mut self, separator: &str) -> Embed {
        self.truncate_parts(separator);

        if self.fields.len() > MAX_FIELDS {
            tracing::warn!(
                "Embed has {} fields, keeping the first {}",
                self.fields.len(),
                MAX_FIELDS
            );
            self.fields.truncate(MAX_FIELDS);
        }

        let mut dropped = 0;
        while self.total_chars() > EMBED_TOTAL_LIMIT && self.fields.pop().is_some() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::warn!("Dropped {} trailing fields to fit the embed size limit", dropped);
        }

        if self.total_chars() > EMBED_TOTAL_LIMIT {
            if let Some(description) = self.description.take() {
                let room = EMBED_TOTAL_LIMIT.saturating_sub(self.total_chars());
                self.description = Some(truncate(&description, room)).filter(|d| !d.is_empty());
            }
        }

        self
    }

    /// Like [`Embed::fit_to_limits`], but fields past the field count or
    /// total size limit move to follow-up embeds instead of being dropped.
    /// The description stays on the first embed and the footer on the last.
    pub fn fit_into_messages(mut self, separator: &str) -> Vec<Embed> {
        self.truncate_parts(separator);
        let fields = std::mem::take(&mut self.fields);
        let footer = self.footer.take();

        let mut embeds = Vec::new();
        let mut current = self;
        for field in fields {
            let size = char_len(&field.name) + char_len(&field.value);
            let full = current.fields.len() >= MAX_FIELDS
                || current.total_chars() + size > EMBED_TOTAL_LIMIT;
            if full && !current.fields.is_empty() {
                let next = current.continuation();
                embeds.push(std::mem::replace(&mut current, next));
            }
            current.fields.push(field);
        }

        if let Some(footer) = footer {
            if current.total_chars() + char_len(&footer.text) > EMBED_TOTAL_LIMIT {
                let next = current.continuation();
                embeds.push(std::mem::replace(&mut current, next));
            }
            current.footer = Some(footer);
        }
        embeds.push(current);

        if embeds.len() > 1 {
            tracing::info!("Embed split into {} messages", embeds.len());
        }
        embeds
    }
}
