use chain_objects::{ids, AccountBalance, Object};
use object_store::Store;
use primitives::{Amount, ObjectId, Space};

use crate::error::MarketError;

/// Finds the `(owner, asset)` balance object, if any already exists.
pub fn find_balance(store: &Store, owner: ObjectId, asset: ObjectId) -> Option<ObjectId> {
	store.indices().balances.by_owner_asset.get(&(owner, asset)).copied()
}

/// Adds `amount` to `owner`'s balance of `asset`, creating the
/// `AccountBalance` object on first use (`spec.md` §3, AccountBalance
/// entity: "unique by pair"). Used by every evaluator and by the Market
/// Engine whenever a fill, fee refund, or settlement credits an account.
pub fn credit_balance(
	store: &mut Store,
	owner: ObjectId,
	asset: ObjectId,
	amount: Amount,
) -> Result<(), MarketError> {
	if amount.is_zero() {
		return Ok(());
	}
	match find_balance(store, owner, asset) {
		Some(id) => {
			store.modify(id, |o| {
				let balance = o.as_account_balance_mut().unwrap();
				balance.amount = balance.amount.checked_add(amount).expect("balance overflow");
			})?;
		}
		None => {
			store.create(Space::Implementation, ids::implementation::ACCOUNT_BALANCE, |id| {
				Object::AccountBalance(AccountBalance { id, owner, asset, amount })
			})?;
		}
	}
	Ok(())
}

/// Subtracts `amount` from `owner`'s balance of `asset`, failing with
/// *insufficient-balance* if the account does not hold enough
/// (`spec.md` §4.C, Transfer: "fails *insufficient-balance*").
pub fn debit_balance(
	store: &mut Store,
	owner: ObjectId,
	asset: ObjectId,
	amount: Amount,
) -> Result<(), MarketError> {
	if amount.is_zero() {
		return Ok(());
	}
	let id = find_balance(store, owner, asset).ok_or(MarketError::InsufficientBalance(owner))?;
	let current = store.get(id)?.as_account_balance().unwrap().amount;
	if current.0 < amount.0 {
		return Err(MarketError::InsufficientBalance(owner));
	}
	store.modify(id, |o| {
		let balance = o.as_account_balance_mut().unwrap();
		balance.amount = balance.amount.checked_sub(amount).expect("checked above");
	})?;
	Ok(())
}

/// Adds `amount` to `asset`'s `AssetDynamicData.accumulated_fees`
/// (`spec.md` §4.D, Market fees).
pub fn accrue_fee(store: &mut Store, asset: ObjectId, amount: Amount) -> Result<(), MarketError> {
	let asset_obj = store.get(asset)?.as_asset().ok_or(MarketError::WrongObjectType(asset))?;
	let dynamic_data = asset_obj.dynamic_data;
	store.modify(dynamic_data, |o| {
		let dd = o.as_asset_dynamic_data_mut().unwrap();
		dd.accumulated_fees = dd.accumulated_fees.checked_add(amount).expect("fee overflow");
	})?;
	Ok(())
}
