//! Markup for references that fall back to the default locale, and for
//! cross references to pages that were never written.
use kuchikikiki::NodeRef;

use crate::{
  context::ResolveContext,
  l10n::{ONLY_IN_DEFAULT_LOCALE, PAGE_NOT_CREATED},
  utils::{add_class, remove_attribute, set_attribute},
};

/// Class on links that point at a default-locale page from a translation.
pub const ONLY_IN_DEFAULT_LOCALE_CLASS: &str = "only-in-default-locale";
/// Class on cross references whose target does not exist.
pub const PAGE_NOT_CREATED_CLASS: &str = "page-not-created";

/// Point `element` at the default-locale page and explain why.
pub fn mark_default_locale(ctx: &ResolveContext<'_>, element: &NodeRef, href: &str) {
  set_attribute(element, "href", href);
  add_class(element, ONLY_IN_DEFAULT_LOCALE_CLASS);
  set_attribute(
    element,
    "title",
    ctx
      .l10n
      .get(ctx.locale, &ctx.options.default_locale, ONLY_IN_DEFAULT_LOCALE),
  );
}

/// Turn `element` into an inert placeholder for a missing page.
pub fn mark_page_not_created(ctx: &ResolveContext<'_>, element: &NodeRef) {
  remove_attribute(element, "href");
  add_class(element, PAGE_NOT_CREATED_CLASS);
  set_attribute(
    element,
    "title",
    ctx
      .l10n
      .get(ctx.locale, &ctx.options.default_locale, PAGE_NOT_CREATED),
  );
}

/// The default-locale counterpart of `path`, when the document is a
/// translation and the reference stays within its own locale.
#[must_use]
pub fn default_locale_path(
  ctx: &ResolveContext<'_>,
  locale: &str,
  slug: &str,
) -> Option<String> {
  if !ctx.is_translated() || !locale.eq_ignore_ascii_case(ctx.locale) {
    return None;
  }
  let resolution = ctx.index.resolve(&ctx.options.default_locale, slug);
  resolution
    .found()
    .then(|| resolution.canonical_path().to_string())
}
