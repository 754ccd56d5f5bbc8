//! Tunables threaded explicitly through every builder entry point.
//!
//! Grounded on the teacher's `ParserConfig` (`radlr-core/types/parser_config.rs`):
//! a plain `Copy` settings struct with doc-commented fields, constructed with
//! `::new()` and customized through chainable setters, rather than a global
//! or environment-sourced configuration (spec §6: the core never reads the
//! environment or files on its own).
#[derive(Debug, Clone, Copy)]
pub struct BuildConfig {
  /// Upper bound on subset-construction DFA state count before the build
  /// aborts with `DfaTooLarge` (spec §4.B). Resolved default, see
  /// SPEC_FULL.md §9: `base + per_ast_node * summed_regex_ast_size`.
  pub dfa_state_budget_base: u32,
  pub dfa_state_budget_per_ast_node: u32,

  /// Whether `ShiftReduceResolved`/`ReduceReduceResolved` diagnostics are
  /// emitted once per LALR state (`true`, the spec's documented
  /// preference) or once per resolved conflict (`false`).
  pub conflict_diagnostics_once_per_state: bool,

  /// Number of rayon worker threads to use for independent per-nonterminal
  /// build work. `1` disables the thread pool and runs sequentially,
  /// which also makes diagnostic collection trivially ordered without
  /// needing the merge step described in SPEC_FULL.md §5.
  pub thread_count: usize,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      dfa_state_budget_base: 512,
      dfa_state_budget_per_ast_node: 16,
      conflict_diagnostics_once_per_state: true,
      thread_count: 1,
    }
  }
}

impl BuildConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_dfa_state_budget(mut self, base: u32, per_ast_node: u32) -> Self {
    self.dfa_state_budget_base = base;
    self.dfa_state_budget_per_ast_node = per_ast_node;
    self
  }

  pub fn with_thread_count(mut self, threads: usize) -> Self {
    self.thread_count = threads.max(1);
    self
  }

  pub fn with_conflict_diagnostics_once_per_occurrence(mut self) -> Self {
    self.conflict_diagnostics_once_per_state = false;
    self
  }

  /// The effective DFA state budget for a regex (or grammar-wide scanner)
  /// whose AST has `ast_node_count` nodes summed across all its terminals.
  pub fn dfa_state_budget(&self, ast_node_count: usize) -> u32 {
    self.dfa_state_budget_base.saturating_add(self.dfa_state_budget_per_ast_node.saturating_mul(ast_node_count as u32))
  }
}
