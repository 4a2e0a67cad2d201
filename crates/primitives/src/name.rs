use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
	#[error("account name must be 3-63 characters, got {0}")]
	BadLength(usize),
	#[error("account name label {0:?} must start and end with a letter or digit")]
	BadLabelEdge(String),
	#[error("account name contains an invalid character: {0:?}")]
	InvalidChar(char),
	#[error("asset symbol must be 3-17 characters, got {0}")]
	BadSymbolLength(usize),
	#[error("asset symbol must be uppercase ASCII with at most one '.' separator: {0:?}")]
	BadSymbolShape(String),
}

/// RFC-1035-like label validation: lowercase, dot-separated labels, each
/// starting and ending with a letter or digit, `-` allowed in the middle,
/// 3-63 characters overall (`spec.md` §3, Account entity).
pub fn validate_account_name(name: &str) -> Result<(), NameError> {
	if name.len() < 3 || name.len() > 63 {
		return Err(NameError::BadLength(name.len()));
	}
	for label in name.split('.') {
		let bytes = label.as_bytes();
		let first_ok = bytes.first().is_some_and(|c| c.is_ascii_alphanumeric());
		let last_ok = bytes.last().is_some_and(|c| c.is_ascii_alphanumeric());
		if !first_ok || !last_ok {
			return Err(NameError::BadLabelEdge(label.to_string()));
		}
		for &c in bytes {
			let ok = c.is_ascii_lowercase() || c.is_ascii_digit() || c == b'-';
			if !ok {
				return Err(NameError::InvalidChar(c as char));
			}
		}
	}
	Ok(())
}

/// Uppercase, optional single `.` separator, 3-17 characters
/// (`spec.md` §3, Asset entity).
pub fn validate_asset_symbol(symbol: &str) -> Result<(), NameError> {
	if symbol.len() < 3 || symbol.len() > 17 {
		return Err(NameError::BadSymbolLength(symbol.len()));
	}
	let dot_count = symbol.matches('.').count();
	let shape_ok = dot_count <= 1
		&& symbol
			.chars()
			.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.')
		&& symbol.chars().next().is_some_and(|c| c.is_ascii_uppercase())
		&& !symbol.starts_with('.')
		&& !symbol.ends_with('.');
	if !shape_ok {
		return Err(NameError::BadSymbolShape(symbol.to_string()));
	}
	Ok(())
}
