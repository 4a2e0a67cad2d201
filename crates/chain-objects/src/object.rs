use serde::{Deserialize, Serialize};

use primitives::ObjectId;

use crate::{
	account::{Account, AccountStatistics},
	asset::{Asset, AssetDynamicData, BitassetData},
	balance::AccountBalance,
	block::BlockSummary,
	market::{CallOrder, CollateralBid, ForceSettlement, LimitOrder},
	proposal::Proposal,
	vesting::VestingBalance,
	withdraw_permission::WithdrawPermission,
	witness::{CommitteeMember, Witness, Worker},
};

/// The single tagged sum type every concrete entity folds into before it is
/// handed to the store, matching Design Note §9's "model dynamic object
/// dispatch as a tagged sum type, one variant per concrete type".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Object {
	Account(Account),
	AccountStatistics(AccountStatistics),
	Asset(Asset),
	AssetDynamicData(AssetDynamicData),
	BitassetData(BitassetData),
	AccountBalance(AccountBalance),
	LimitOrder(LimitOrder),
	CallOrder(CallOrder),
	ForceSettlement(ForceSettlement),
	CollateralBid(CollateralBid),
	Proposal(Proposal),
	Witness(Witness),
	CommitteeMember(CommitteeMember),
	Worker(Worker),
	VestingBalance(VestingBalance),
	WithdrawPermission(WithdrawPermission),
	BlockSummary(BlockSummary),
}

/// Extracts the [`ObjectId`] common to every variant, needed by the store's
/// generic `create`/`modify`/`remove` primitives which operate on `Object`
/// without matching on the concrete type.
impl Object {
	pub fn id(&self) -> ObjectId {
		match self {
			Object::Account(o) => o.id,
			Object::AccountStatistics(o) => o.id,
			Object::Asset(o) => o.id,
			Object::AssetDynamicData(o) => o.id,
			Object::BitassetData(o) => o.id,
			Object::AccountBalance(o) => o.id,
			Object::LimitOrder(o) => o.id,
			Object::CallOrder(o) => o.id,
			Object::ForceSettlement(o) => o.id,
			Object::CollateralBid(o) => o.id,
			Object::Proposal(o) => o.id,
			Object::Witness(o) => o.id,
			Object::CommitteeMember(o) => o.id,
			Object::Worker(o) => o.id,
			Object::VestingBalance(o) => o.id,
			Object::WithdrawPermission(o) => o.id,
			Object::BlockSummary(o) => o.id,
		}
	}
}

/// Generates `impl From<T> for Object`, `TryFrom<&Object> for &T` /
/// `TryFrom<Object> for T`, and a `Object::as_<snake>`/`expect_<snake>`
/// accessor pair for each concrete entity type, so evaluators can write
/// `store.get(id)?.expect_account()` instead of matching on `Object`
/// everywhere (mirrors the per-type accessor style `cf-amm`'s pool index
/// uses over its own tagged range/liquidity types).
macro_rules! object_variant {
	($variant:ident, $ty:ty, $as_ref:ident, $as_mut:ident, $into:ident) => {
		impl From<$ty> for Object {
			fn from(value: $ty) -> Self {
				Object::$variant(value)
			}
		}

		impl Object {
			pub fn $as_ref(&self) -> Option<&$ty> {
				match self {
					Object::$variant(o) => Some(o),
					_ => None,
				}
			}

			pub fn $as_mut(&mut self) -> Option<&mut $ty> {
				match self {
					Object::$variant(o) => Some(o),
					_ => None,
				}
			}

			pub fn $into(self) -> Option<$ty> {
				match self {
					Object::$variant(o) => Some(o),
					_ => None,
				}
			}
		}
	};
}

object_variant!(Account, Account, as_account, as_account_mut, into_account);
object_variant!(
	AccountStatistics,
	AccountStatistics,
	as_account_statistics,
	as_account_statistics_mut,
	into_account_statistics
);
object_variant!(Asset, Asset, as_asset, as_asset_mut, into_asset);
object_variant!(
	AssetDynamicData,
	AssetDynamicData,
	as_asset_dynamic_data,
	as_asset_dynamic_data_mut,
	into_asset_dynamic_data
);
object_variant!(
	BitassetData,
	BitassetData,
	as_bitasset_data,
	as_bitasset_data_mut,
	into_bitasset_data
);
object_variant!(
	AccountBalance,
	AccountBalance,
	as_account_balance,
	as_account_balance_mut,
	into_account_balance
);
object_variant!(LimitOrder, LimitOrder, as_limit_order, as_limit_order_mut, into_limit_order);
object_variant!(CallOrder, CallOrder, as_call_order, as_call_order_mut, into_call_order);
object_variant!(
	ForceSettlement,
	ForceSettlement,
	as_force_settlement,
	as_force_settlement_mut,
	into_force_settlement
);
object_variant!(
	CollateralBid,
	CollateralBid,
	as_collateral_bid,
	as_collateral_bid_mut,
	into_collateral_bid
);
object_variant!(Proposal, Proposal, as_proposal, as_proposal_mut, into_proposal);
object_variant!(Witness, Witness, as_witness, as_witness_mut, into_witness);
object_variant!(
	CommitteeMember,
	CommitteeMember,
	as_committee_member,
	as_committee_member_mut,
	into_committee_member
);
object_variant!(Worker, Worker, as_worker, as_worker_mut, into_worker);
object_variant!(
	VestingBalance,
	VestingBalance,
	as_vesting_balance,
	as_vesting_balance_mut,
	into_vesting_balance
);
object_variant!(
	WithdrawPermission,
	WithdrawPermission,
	as_withdraw_permission,
	as_withdraw_permission_mut,
	into_withdraw_permission
);
object_variant!(
	BlockSummary,
	BlockSummary,
	as_block_summary,
	as_block_summary_mut,
	into_block_summary
);
