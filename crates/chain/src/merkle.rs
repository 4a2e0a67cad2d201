use sha2::{Digest, Sha256};

/// Binary, left-heavy merkle-pair reduction over leaf hashes
/// (`spec.md` §6: "the digest of all included transactions' merkle-pair
/// reduction (binary, left-heavy per §8 scenarios)"). Pairs adjacent
/// hashes two at a time; an odd hash left over at the end of a level is
/// carried forward unpaired rather than duplicated, so the left side of
/// the tree always carries the extra weight of an unbalanced leaf count.
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
	if leaves.is_empty() {
		return [0u8; 32];
	}
	let mut level: Vec<[u8; 32]> = leaves.to_vec();
	while level.len() > 1 {
		let mut next = Vec::with_capacity(level.len().div_ceil(2));
		let mut pairs = level.chunks_exact(2);
		for pair in &mut pairs {
			next.push(hash_pair(&pair[0], &pair[1]));
		}
		if let [carry] = pairs.remainder() {
			next.push(*carry);
		}
		level = next;
	}
	level[0]
}

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
	let mut hasher = Sha256::new();
	hasher.update(left);
	hasher.update(right);
	hasher.finalize().into()
}
