use bankport_core::marker::has_account_tag;
use bankport_core::{
    CategoryDirection, CategoryId, ExternalAccountId, LedgerAccount, LedgerAccountId,
    LedgerCategory,
};
use bankport_ledger::{LedgerApi, LedgerError};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::ImportError;

pub const DEFAULT_TRANSFER_IN_CATEGORY: &str = "Allgemeiner Transfer:Banküberweisung (extern)";
pub const DEFAULT_TRANSFER_OUT_CATEGORY: &str = "Allgemeiner Transfer:Banküberweisung (extern)";
pub const DEFAULT_INTERNAL_TRANSFER_CATEGORY: &str = "Allgemeiner Transfer:Banküberweisung";

// ── Accounts ──────────────────────────────────────────────────────────────────

/// Maps external account ids to ledger accounts via the account marker in the
/// ledger account's note. Accounts without a well-formed marker are not
/// addressable.
#[derive(Debug, Default)]
pub struct AccountDirectory {
    by_external: HashMap<ExternalAccountId, LedgerAccountId>,
}

impl AccountDirectory {
    pub fn load<L: LedgerApi>(ledger: &L) -> Result<Self, LedgerError> {
        let accounts = ledger.list_accounts()?;
        let directory = Self::from_accounts(&accounts);
        debug!(
            "{} of {} ledger accounts carry an account marker",
            directory.len(),
            accounts.len()
        );
        Ok(directory)
    }

    pub fn from_accounts(accounts: &[LedgerAccount]) -> Self {
        let mut by_external = HashMap::new();
        for account in accounts {
            match account.external_id() {
                Some(external) => {
                    if let Some(first) = by_external.get(&external) {
                        warn!(
                            "Accounts {} and {} both claim external account {}; keeping {}",
                            first, account.id, external, first
                        );
                        continue;
                    }
                    by_external.insert(external, account.id.clone());
                }
                None if has_account_tag(&account.note) => {
                    warn!(
                        "Account {} ({}) has a malformed account marker and is ignored",
                        account.id, account.name
                    );
                }
                None => {}
            }
        }
        Self { by_external }
    }

    pub fn resolve(&self, external: &ExternalAccountId) -> Option<&LedgerAccountId> {
        self.by_external.get(external)
    }

    pub fn len(&self) -> usize {
        self.by_external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_external.is_empty()
    }
}

// ── Categories ────────────────────────────────────────────────────────────────

/// Categories used for transfers whose two legs are written separately or
/// together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCategories {
    pub incoming: CategoryId,
    pub outgoing: CategoryId,
    /// Ledger-native transfer category for matched pairs, if the ledger has one.
    pub internal: Option<CategoryId>,
}

/// How a category name was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryResolution<'a> {
    Exact(&'a CategoryId),
    /// Only the main part of a `Main:Sub` name matched.
    Parent(&'a CategoryId),
    Default(&'a CategoryId),
}

impl<'a> CategoryResolution<'a> {
    pub fn id(&self) -> &'a CategoryId {
        match *self {
            CategoryResolution::Exact(id)
            | CategoryResolution::Parent(id)
            | CategoryResolution::Default(id) => id,
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, CategoryResolution::Exact(_))
    }
}

#[derive(Debug)]
pub struct CategoryDirectory {
    categories: Vec<LedgerCategory>,
    by_name: HashMap<(CategoryDirection, String), CategoryId>,
    default: CategoryId,
}

impl CategoryDirectory {
    pub fn load<L: LedgerApi>(ledger: &L, default: CategoryId) -> Result<Self, LedgerError> {
        let categories = ledger.list_categories()?;
        debug!("Loaded {} ledger categories", categories.len());
        Ok(Self::from_categories(categories, default))
    }

    pub fn from_categories(categories: Vec<LedgerCategory>, default: CategoryId) -> Self {
        let mut by_name = HashMap::new();
        for category in &categories {
            by_name
                .entry((category.direction, category.name.clone()))
                .or_insert_with(|| category.id.clone());
        }
        Self {
            categories,
            by_name,
            default,
        }
    }

    /// Locates the categories for unmatched transfer legs. Both directions
    /// must exist; a run cannot write external transfers otherwise.
    ///
    /// A category explicitly marked as transfer-in (or -out) wins; otherwise
    /// the income (or expense) category with the configured name is used.
    /// Matched pairs go to the transfer category named `internal_name`, or
    /// the first transfer category when no such name exists.
    pub fn load_transfer_categories(
        &self,
        incoming_name: &str,
        outgoing_name: &str,
        internal_name: &str,
    ) -> Result<TransferCategories, ImportError> {
        let incoming = self
            .first_with(CategoryDirection::TransferIn)
            .or_else(|| self.named(CategoryDirection::Income, incoming_name))
            .ok_or_else(|| ImportError::MissingTransferCategory {
                direction: CategoryDirection::TransferIn,
                name: incoming_name.to_string(),
            })?;
        let outgoing = self
            .first_with(CategoryDirection::TransferOut)
            .or_else(|| self.named(CategoryDirection::Expense, outgoing_name))
            .ok_or_else(|| ImportError::MissingTransferCategory {
                direction: CategoryDirection::TransferOut,
                name: outgoing_name.to_string(),
            })?;
        let internal = self
            .named(CategoryDirection::Transfer, internal_name)
            .or_else(|| {
                let fallback = self.first_with(CategoryDirection::Transfer);
                if let Some(id) = &fallback {
                    warn!("No transfer category named {internal_name:?}; using {id}");
                }
                fallback
            });

        debug!(
            "Transfer categories: in={}, out={}, internal={:?}",
            incoming, outgoing, internal
        );
        Ok(TransferCategories {
            incoming,
            outgoing,
            internal,
        })
    }

    /// Resolves an export category name for an income or expense record:
    /// exact name first, then the main part of `Main:Sub`, then the default.
    pub fn resolve(&self, name: &str, direction: CategoryDirection) -> CategoryResolution<'_> {
        let name = name.trim();
        if name.is_empty() {
            return CategoryResolution::Default(&self.default);
        }
        if let Some(id) = self.by_name.get(&(direction, name.to_string())) {
            return CategoryResolution::Exact(id);
        }
        if let Some((main, _)) = name.split_once(':') {
            if let Some(id) = self.by_name.get(&(direction, main.trim().to_string())) {
                return CategoryResolution::Parent(id);
            }
        }
        CategoryResolution::Default(&self.default)
    }

    fn first_with(&self, direction: CategoryDirection) -> Option<CategoryId> {
        self.categories
            .iter()
            .find(|c| c.direction == direction)
            .map(|c| c.id.clone())
    }

    fn named(&self, direction: CategoryDirection, name: &str) -> Option<CategoryId> {
        self.by_name.get(&(direction, name.to_string())).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankport_ledger::MemoryLedger;

    fn categories() -> Vec<LedgerCategory> {
        vec![
            LedgerCategory::new("10", "Food", CategoryDirection::Expense),
            LedgerCategory::new("11", "Food:Supermarket", CategoryDirection::Expense),
            LedgerCategory::new("20", "Salary", CategoryDirection::Income),
            LedgerCategory::new("30", DEFAULT_TRANSFER_IN_CATEGORY, CategoryDirection::Income),
            LedgerCategory::new("31", DEFAULT_TRANSFER_OUT_CATEGORY, CategoryDirection::Expense),
        ]
    }

    #[test]
    fn accounts_resolve_through_their_marker() {
        let ledger = MemoryLedger::new()
            .with_account(LedgerAccount::new("1", "Checking", "main [B4AccID:111]"))
            .with_account(LedgerAccount::new("2", "Savings", "[B4AccID:abc]"))
            .with_account(LedgerAccount::new("3", "Cash", ""));
        let directory = AccountDirectory::load(&ledger).unwrap();

        assert_eq!(directory.len(), 1);
        assert_eq!(
            directory.resolve(&ExternalAccountId::new("111")),
            Some(&LedgerAccountId::new("1"))
        );
        assert_eq!(directory.resolve(&ExternalAccountId::new("abc")), None);
    }

    #[test]
    fn first_account_wins_a_duplicate_marker() {
        let directory = AccountDirectory::from_accounts(&[
            LedgerAccount::new("1", "A", "[B4AccID:111]"),
            LedgerAccount::new("2", "B", "[B4AccID:111]"),
        ]);
        assert_eq!(
            directory.resolve(&ExternalAccountId::new("111")),
            Some(&LedgerAccountId::new("1"))
        );
    }

    #[test]
    fn category_resolution_order() {
        let directory = CategoryDirectory::from_categories(categories(), CategoryId::new("0"));

        let exact = directory.resolve("Food:Supermarket", CategoryDirection::Expense);
        assert_eq!(exact, CategoryResolution::Exact(&CategoryId::new("11")));
        assert!(!exact.is_fallback());

        let parent = directory.resolve("Food:Restaurant", CategoryDirection::Expense);
        assert_eq!(parent, CategoryResolution::Parent(&CategoryId::new("10")));
        assert!(parent.is_fallback());

        let wrong_direction = directory.resolve("Salary", CategoryDirection::Expense);
        assert_eq!(wrong_direction.id(), &CategoryId::new("0"));

        assert_eq!(
            directory.resolve("", CategoryDirection::Income),
            CategoryResolution::Default(&CategoryId::new("0"))
        );
    }

    #[test]
    fn transfer_categories_by_name() {
        let directory = CategoryDirectory::from_categories(categories(), CategoryId::new("0"));
        let found = directory
            .load_transfer_categories(
                DEFAULT_TRANSFER_IN_CATEGORY,
                DEFAULT_TRANSFER_OUT_CATEGORY,
                DEFAULT_INTERNAL_TRANSFER_CATEGORY,
            )
            .unwrap();
        assert_eq!(found.incoming, CategoryId::new("30"));
        assert_eq!(found.outgoing, CategoryId::new("31"));
        assert_eq!(found.internal, None);
    }

    #[test]
    fn explicit_transfer_directions_win() {
        let mut list = categories();
        list.push(LedgerCategory::new("40", "Incoming", CategoryDirection::TransferIn));
        list.push(LedgerCategory::new("41", "Outgoing", CategoryDirection::TransferOut));
        list.push(LedgerCategory::new("42", "Transfer", CategoryDirection::Transfer));
        let directory = CategoryDirectory::from_categories(list, CategoryId::new("0"));

        let found = directory.load_transfer_categories("x", "y", "z").unwrap();
        assert_eq!(found.incoming, CategoryId::new("40"));
        assert_eq!(found.outgoing, CategoryId::new("41"));
        assert_eq!(found.internal, Some(CategoryId::new("42")));
    }

    #[test]
    fn matched_pairs_use_the_named_transfer_subcategory() {
        let mut list = categories();
        list.push(LedgerCategory::new("50", "Allgemeiner Transfer", CategoryDirection::Transfer));
        list.push(LedgerCategory::new(
            "51",
            DEFAULT_INTERNAL_TRANSFER_CATEGORY,
            CategoryDirection::Transfer,
        ));
        let directory = CategoryDirectory::from_categories(list.clone(), CategoryId::new("0"));
        let found = directory
            .load_transfer_categories(
                DEFAULT_TRANSFER_IN_CATEGORY,
                DEFAULT_TRANSFER_OUT_CATEGORY,
                DEFAULT_INTERNAL_TRANSFER_CATEGORY,
            )
            .unwrap();
        assert_eq!(found.internal, Some(CategoryId::new("51")));

        list.retain(|c| c.id != CategoryId::new("51"));
        let directory = CategoryDirectory::from_categories(list, CategoryId::new("0"));
        let found = directory
            .load_transfer_categories(
                DEFAULT_TRANSFER_IN_CATEGORY,
                DEFAULT_TRANSFER_OUT_CATEGORY,
                DEFAULT_INTERNAL_TRANSFER_CATEGORY,
            )
            .unwrap();
        assert_eq!(found.internal, Some(CategoryId::new("50")));
    }

    #[test]
    fn missing_transfer_category_is_an_error() {
        let list = vec![LedgerCategory::new("30", "In", CategoryDirection::Income)];
        let directory = CategoryDirectory::from_categories(list, CategoryId::new("0"));
        let err = directory.load_transfer_categories("In", "Out", "Both").unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingTransferCategory {
                direction: CategoryDirection::TransferOut,
                ..
            }
        ));
    }
}
