/// Maximum length of a slug derived from a title. Longer titles are cut at
/// this bound before the uniqueness suffix is considered.
pub const MAX_SLUG_LEN: usize = 100;

/// Base used when the title contains no alphanumeric characters at all.
pub const FALLBACK_SLUG: &str = "untitled";

/// How many `-2`, `-3`, ... candidates to probe before giving up on a
/// readable suffix and appending a timestamp instead.
pub const MAX_SLUG_PROBES: u32 = 100;

/// Derives the URL-safe base slug for a title: lowercase, every run of
/// non-`[a-z0-9]` characters collapsed to a single `-`, no leading or
/// trailing `-`, at most [`MAX_SLUG_LEN`] characters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for c in title.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Produces candidate slugs for the collision-retry loop: the base itself,
/// then `base-2`, `base-3`, ... up to [`MAX_SLUG_PROBES`], and finally a
/// unix-timestamp suffix that cannot realistically collide. The caller
/// checks each candidate against the slug index inside its own write
/// transaction, so the first free candidate wins race-free.
pub fn slug_candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    let timestamped = format!("{}-{}", base, chrono::Utc::now().timestamp_millis());
    std::iter::once(base.to_string())
        .chain((2..=MAX_SLUG_PROBES).map(move |n| format!("{}-{}", base, n)))
        .chain(std::iter::once(timestamped))
}
