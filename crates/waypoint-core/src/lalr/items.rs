//! Canonical LR(0) item-set construction (spec §4.D): the automaton that
//! LALR(1) lookahead propagation ([`super::lookahead`]) is layered on top
//! of.

use std::collections::BTreeMap;

use crate::grammar::production::Production;
use crate::types::{Array, NonTerminalId, ProductionId, SymbolId};

/// `(production, dot)`: the dot sits before `rhs[dot]`, or at the end when
/// `dot == rhs.len()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Item {
  pub production: ProductionId,
  pub dot: usize,
}

pub type ItemSet = std::collections::BTreeSet<Item>;

#[derive(Clone, Debug, Default)]
pub struct Lr0Automaton {
  pub states: Array<ItemSet>,
  /// Outgoing transitions per state, keyed by the symbol advanced over.
  pub transitions: Array<BTreeMap<SymbolId, usize>>,
}

/// Productions grouped by head, for fast closure expansion.
pub struct ProductionsByHead<'a> {
  productions: &'a [Production],
  by_head: BTreeMap<NonTerminalId, Vec<ProductionId>>,
}

impl<'a> ProductionsByHead<'a> {
  pub fn new(productions: &'a [Production]) -> Self {
    let mut by_head: BTreeMap<NonTerminalId, Vec<ProductionId>> = BTreeMap::new();
    for (index, production) in productions.iter().enumerate() {
      by_head.entry(production.head).or_default().push(ProductionId::from(index));
    }
    Self { productions, by_head }
  }

  pub fn get(&self, production: ProductionId) -> &Production {
    &self.productions[production.index()]
  }

  pub fn of(&self, head: NonTerminalId) -> &[ProductionId] {
    self.by_head.get(&head).map(Vec::as_slice).unwrap_or(&[])
  }
}

fn symbol_at(productions: &ProductionsByHead, item: Item) -> Option<SymbolId> {
  productions.get(item.production).symbols.get(item.dot).copied()
}

fn closure(productions: &ProductionsByHead, mut items: ItemSet) -> ItemSet {
  let mut worklist: Vec<Item> = items.iter().copied().collect();
  while let Some(item) = worklist.pop() {
    if let Some(SymbolId::NonTerminal(head)) = symbol_at(productions, item) {
      for &production in productions.of(head) {
        let new_item = Item { production, dot: 0 };
        if items.insert(new_item) {
          worklist.push(new_item);
        }
      }
    }
  }
  items
}

fn goto(productions: &ProductionsByHead, items: &ItemSet, symbol: SymbolId) -> ItemSet {
  let advanced: ItemSet = items
    .iter()
    .filter(|item| symbol_at(productions, **item) == Some(symbol))
    .map(|item| Item { production: item.production, dot: item.dot + 1 })
    .collect();
  closure(productions, advanced)
}

/// Builds the canonical LR(0) automaton, starting from the single item
/// `start_production -> .symbols`, augmented beforehand by the caller
/// (spec §4.D: item-set construction over the augmented grammar).
pub fn build_lr0_automaton(productions: &ProductionsByHead, start_production: ProductionId) -> Lr0Automaton {
  let start_items = closure(productions, ItemSet::from([Item { production: start_production, dot: 0 }]));

  let mut states: Array<ItemSet> = vec![start_items.clone()];
  let mut index_of: BTreeMap<ItemSet, usize> = BTreeMap::from([(start_items, 0)]);
  let mut transitions: Array<BTreeMap<SymbolId, usize>> = vec![BTreeMap::new()];
  let mut worklist = vec![0usize];

  while let Some(state_index) = worklist.pop() {
    let symbols: Vec<SymbolId> = states[state_index].iter().filter_map(|item| symbol_at(productions, *item)).collect();
    let mut distinct: Vec<SymbolId> = symbols;
    distinct.sort();
    distinct.dedup();

    for symbol in distinct {
      let target = goto(productions, &states[state_index], symbol);
      if target.is_empty() {
        continue;
      }
      let target_index = match index_of.get(&target) {
        Some(&idx) => idx,
        None => {
          let idx = states.len();
          index_of.insert(target.clone(), idx);
          states.push(target);
          transitions.push(BTreeMap::new());
          worklist.push(idx);
          idx
        }
      };
      transitions[state_index].insert(symbol, target_index);
    }
  }

  Lr0Automaton { states, transitions }
}
