use crate::properties::strategies::{address_list_strategy, evm_address_strategy};

use proptest::{prelude::*, test_runner::Config};
use wallet_notifier::services::blockwatcher::{AddressBook, AddressSet};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_membership_ignores_case(addresses in address_list_strategy()) {
		let set: AddressSet = addresses.iter().collect();
		for address in &addresses {
			prop_assert!(set.contains(address));
			prop_assert!(set.contains(&address.to_uppercase().replacen("0X", "0x", 1)));
			let padded = format!("  {}  ", address.to_lowercase());
			prop_assert!(set.contains(&padded));
		}
	}

	#[test]
	fn test_absent_addresses_are_not_contained(
		addresses in address_list_strategy(),
		candidate in evm_address_strategy(),
	) {
		prop_assume!(!addresses.iter().any(|a| a.eq_ignore_ascii_case(&candidate)));
		let set: AddressSet = addresses.iter().collect();
		prop_assert!(!set.contains(&candidate));
		prop_assert!(set.len() <= addresses.len());
	}

	#[test]
	fn test_replace_never_mutates_a_snapshot(
		first in address_list_strategy(),
		second in address_list_strategy(),
	) {
		let book = AddressBook::new(first.iter().collect());
		let before = book.snapshot();

		let installed = book.replace(second.iter().collect());
		let after = book.snapshot();

		prop_assert_eq!(&*before, &first.iter().collect::<AddressSet>());
		prop_assert_eq!(&*after, &second.iter().collect::<AddressSet>());
		prop_assert_eq!(installed, after.len());
	}
}
