//! Precompiled grammars bundled into a host container (spec §6
//! "Precompiled grammars in host containers"): opaque named resources
//! whose names end in a sentinel suffix, enumerated from an
//! embedder-supplied lookup and loaded on demand.
//!
//! Grounded on `once_cell`'s use for lazy, global-free caches in the
//! closest-fit example repo in the retrieval pack for this kind of
//! embedded-resource lookup (`lang-pt`'s dependency on `once_cell`); per
//! spec §9 "Global state" this is an explicit per-`HostResources` cache,
//! never a process-wide singleton.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use waypoint_core::error::Fatal;
use waypoint_core::Grammar;

/// The suffix a host resource's name must carry to be considered a
/// precompiled grammar (spec §6).
pub const PRECOMPILED_SUFFIX: &str = ".precompiled.wgr";

/// An embedder-supplied way to enumerate and fetch named byte resources
/// bundled inside some host artifact (an executable, an asset bundle, …).
/// `waypoint` never assumes a filesystem or any particular container
/// format — the embedder's closure is the only I/O here (spec §6 "The
/// core does not read environment variables or files by itself").
pub trait ResourceSource {
  /// All resource names currently available, in no particular order.
  /// Called once per [`HostResources::refresh_index`]; implementations
  /// backed by a static bundle may just return a fixed list every time.
  fn resource_names(&self) -> Vec<String>;

  /// Fetches one resource's bytes by name, or `None` if it doesn't exist
  /// (a resource can vanish between `resource_names` and `fetch` for a
  /// host artifact that unloads concurrently; spec §6 "safe under
  /// concurrent invocation").
  fn fetch(&self, name: &str) -> Option<Vec<u8>>;
}

/// Enumerates a [`ResourceSource`]'s resources, filters to the
/// `.precompiled.wgr` suffix, and caches the resulting [`Grammar`]
/// artifacts by name (spec §6: "Resource lookup must be idempotent and
/// safe under concurrent invocation; the lookup table is cached
/// per-host-artifact").
///
/// The cache is a plain field here, not a global: an embedder that wants
/// no caching at all can just skip this type and call
/// [`waypoint_core::format::load_from_bytes`] directly on bytes from its
/// own `ResourceSource` (spec §9 "Global state": "Do not introduce
/// process-wide mutable singletons").
pub struct HostResources<S> {
  source: S,
  index: OnceCell<Vec<String>>,
  cache: Mutex<HashMap<String, Arc<Grammar>>>,
  caching_enabled: bool,
}

impl<S: ResourceSource> HostResources<S> {
  pub fn new(source: S) -> Self {
    Self { source, index: OnceCell::new(), cache: Mutex::new(HashMap::new()), caching_enabled: true }
  }

  /// Disables the grammar cache: every [`HostResources::load`] call
  /// re-parses the resource's bytes instead of reusing a previous
  /// [`Grammar`] (spec §6 "callers may disable the cache entirely").
  pub fn without_cache(mut self) -> Self {
    self.caching_enabled = false;
    self
  }

  /// The names of every bundled resource ending in
  /// [`PRECOMPILED_SUFFIX`], computed once and memoized (spec §6
  /// "idempotent").
  pub fn precompiled_names(&self) -> &[String] {
    self.index.get_or_init(|| {
      let mut names: Vec<String> = self.source.resource_names().into_iter().filter(|name| name.ends_with(PRECOMPILED_SUFFIX)).collect();
      names.sort();
      names
    })
  }

  /// Loads (and, unless disabled, caches) the grammar bundled under
  /// `name`. Returns `None` if `name` isn't a known precompiled resource;
  /// `Some(Err(_))` if it is but its bytes fail to load (spec §7
  /// `GrammarVersionTooOld`/`GrammarVersionTooNew`/malformed artifact are
  /// all [`Fatal`], never a panic, since a bundled grammar coming from a
  /// stale build is an ordinary operational condition, not a programmer
  /// error).
  pub fn load(&self, name: &str) -> Option<Result<Arc<Grammar>, Fatal>> {
    if !self.precompiled_names().iter().any(|n| n == name) {
      return None;
    }
    if self.caching_enabled {
      if let Some(hit) = self.cache.lock().expect("precompiled-grammar cache mutex poisoned by a panicking thread").get(name) {
        return Some(Ok(Arc::clone(hit)));
      }
    }
    let bytes = self.source.fetch(name)?;
    let grammar = match waypoint_core::format::load_from_bytes(&bytes) {
      Ok((grammar, _diagnostics)) => Arc::new(grammar),
      Err(err) => return Some(Err(err)),
    };
    if self.caching_enabled {
      self.cache.lock().expect("precompiled-grammar cache mutex poisoned by a panicking thread").insert(name.to_string(), Arc::clone(&grammar));
    }
    Some(Ok(grammar))
  }
}

#[cfg(test)]
mod test {
  use super::*;

  struct FixedBundle {
    resources: HashMap<String, Vec<u8>>,
  }

  impl ResourceSource for FixedBundle {
    fn resource_names(&self) -> Vec<String> {
      self.resources.keys().cloned().collect()
    }

    fn fetch(&self, name: &str) -> Option<Vec<u8>> {
      self.resources.get(name).cloned()
    }
  }

  fn bundle_with(name: &str, bytes: Vec<u8>) -> FixedBundle {
    let mut resources = HashMap::new();
    resources.insert(name.to_string(), bytes);
    resources.insert("readme.txt".to_string(), b"not a grammar".to_vec());
    FixedBundle { resources }
  }

  #[test]
  fn filters_to_the_precompiled_suffix() {
    let host = HostResources::new(bundle_with("lang.precompiled.wgr", vec![0u8; 4]));
    assert_eq!(host.precompiled_names(), &["lang.precompiled.wgr".to_string()]);
  }

  #[test]
  fn unknown_name_returns_none_rather_than_an_error() {
    let host = HostResources::new(bundle_with("lang.precompiled.wgr", vec![0u8; 4]));
    assert!(host.load("missing.precompiled.wgr").is_none());
  }

  #[test]
  fn malformed_bytes_surface_as_fatal_not_a_panic() {
    let host = HostResources::new(bundle_with("lang.precompiled.wgr", vec![0u8; 64]));
    match host.load("lang.precompiled.wgr") {
      Some(Err(Fatal::MalformedArtifact(_))) => {}
      other => panic!("expected a MalformedArtifact Fatal, got {other:?}"),
    }
  }
}
