use crate::balance::{is_zero, merge, Balance, Balances};

use indexmap::IndexMap;
use rust_decimal::Decimal;

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Account path delimiters, the ASCII colon and its full-width sibling.
pub const DELIMITERS: [char; 2] = [':', '：'];

/// Split an account path into its segments, e.g. `Assets:Bank:Jawir`.
pub fn segments(path: &str) -> Vec<&str> {
    path.split(&DELIMITERS[..]).map(str::trim).collect()
}

/// Relative worth of currencies, used only to order accounts for display.
/// Currencies not listed weigh 1.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrencyWeights(IndexMap<String, Decimal>);

impl Default for CurrencyWeights {
    fn default() -> Self {
        Self::empty().with("¥", Decimal::ONE).with("$", Decimal::from(7))
    }
}

impl CurrencyWeights {
    pub fn empty() -> Self {
        Self(IndexMap::new())
    }

    pub fn with(mut self, currency: &str, weight: Decimal) -> Self {
        self.set(currency, weight);
        self
    }

    pub fn set(&mut self, currency: &str, weight: Decimal) {
        self.0.insert(currency.to_string(), weight);
    }

    pub fn weight(&self, currency: &str) -> Decimal {
        self.0.get(currency).copied().unwrap_or(Decimal::ONE)
    }

    /// Collapse a balance into one number. Saturates instead of overflowing,
    /// this is a sort key and nothing else.
    pub fn weigh(&self, balance: &Balance) -> Decimal {
        balance.iter().fold(Decimal::ZERO, |acc, (currency, nominal)| {
            let weighted = nominal
                .checked_mul(self.weight(currency))
                .unwrap_or(Decimal::MAX);
            acc.checked_add(weighted).unwrap_or(Decimal::MAX)
        })
    }
}

/// One segment of the account hierarchy.
/// `balance` is the total of this account and everything below it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountNode {
    pub balance: Balance,
    pub children: BTreeMap<String, AccountNode>,
}

/// A node ready for display, as yielded by [`AccountNode::rows`].
#[derive(Debug, PartialEq)]
pub struct AccountRow<'a> {
    pub depth: usize,
    pub name: &'a str,
    pub balance: &'a Balance,
}

impl AccountNode {
    /// Fold flat balances into a tree. The returned node is the unnamed root,
    /// holding the grand total.
    pub fn build(balances: &Balances) -> AccountNode {
        let mut root = AccountNode::default();
        for (account, balance) in balances.iter() {
            root.add(&segments(account), balance);
        }
        root
    }

    fn add(&mut self, path: &[&str], balance: &Balance) {
        merge(&mut self.balance, balance);
        if let Some((head, rest)) = path.split_first() {
            self.children
                .entry(head.to_string())
                .or_default()
                .add(rest, balance);
        }
    }

    /// Look up a descendant by account path.
    pub fn find(&self, path: &str) -> Option<&AccountNode> {
        segments(path)
            .into_iter()
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    pub fn is_zero(&self) -> bool {
        is_zero(&self.balance)
    }

    /// Children, heaviest first by absolute weighted total, then by name.
    pub fn sorted_children<'a>(
        &'a self,
        weights: &CurrencyWeights,
    ) -> Vec<(&'a String, &'a AccountNode)> {
        let mut children: Vec<_> = self
            .children
            .iter()
            .map(|(name, node)| (weights.weigh(&node.balance).abs(), name, node))
            .collect();
        children.sort_by(|(lw, lname, _), (rw, rname, _)| match rw.cmp(lw) {
            Ordering::Equal => lname.cmp(rname),
            ord => ord,
        });
        children
            .into_iter()
            .map(|(_, name, node)| (name, node))
            .collect()
    }

    /// Depth first walk below this node in display order. Nodes that are zero
    /// in every currency are walked through but not yielded.
    pub fn rows<'a>(&'a self, weights: &CurrencyWeights) -> Vec<AccountRow<'a>> {
        let mut rows = Vec::new();
        self.collect_rows(weights, 0, &mut rows);
        rows
    }

    fn collect_rows<'a>(
        &'a self,
        weights: &CurrencyWeights,
        depth: usize,
        rows: &mut Vec<AccountRow<'a>>,
    ) {
        for (name, node) in self.sorted_children(weights) {
            if !node.is_zero() {
                rows.push(AccountRow {
                    depth,
                    name,
                    balance: &node.balance,
                });
            }
            node.collect_rows(weights, depth + 1, rows);
        }
    }
}
