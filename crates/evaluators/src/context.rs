use primitives::BlockTime;

/// The handful of chain-wide parameters evaluators consult but never own
/// (`SPEC_FULL.md` §3: "`ChainParameters`/`FeeSchedule`... carried as plain
/// struct fields on `chain::Chain`"). Evaluators borrow a `&EvaluationContext`
/// built by the block processor from its own `Chain` fields each time it
/// applies an operation, rather than depending on the `chain` crate (which
/// itself depends on `evaluators`).
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext {
	pub head_time: BlockTime,
	/// Bound on `Authority::total_membership()` for account create/update
	/// (`spec.md` §4.C, Account create / update: "authority-membership bound").
	pub max_authority_membership: u16,
	/// Minimum `review_period_seconds` a proposal must declare when any
	/// nested operation requires committee or witness authority
	/// (`spec.md` §4.C, Proposal create).
	pub min_review_period_seconds: u64,
	/// Set only while [`crate::proposal::try_execute`] is replaying a
	/// proposal's nested operations. `WitnessUpdate`/`CommitteeMemberUpdate`
	/// name the committee account as their required authority, but nobody
	/// signs for that account directly (`spec.md` §4.B: "a transaction
	/// whose signer satisfies only committee authority is invalid outside
	/// the proposal mechanism") — every other caller builds a context with
	/// this `false`, so the two evaluators reject the operation outright
	/// when it is submitted as an ordinary top-level transaction.
	pub evaluating_proposed_transaction: bool,
}
