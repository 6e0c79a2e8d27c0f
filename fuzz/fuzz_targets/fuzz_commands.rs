#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use memplace::{AddressSpace, SimConfig};

#[derive(Arbitrary, Debug)]
enum Command {
    Alloc { owner: u8, size: i16, strategy: String },
    Free { owner: u8 },
    Suggest { size: i16 },
    Reset,
}

#[derive(Arbitrary, Debug)]
struct Input {
    capacity: u16,
    commands: Vec<Command>,
}

fuzz_target!(|input: Input| {
    let mut space = AddressSpace::new(SimConfig {
        capacity: u64::from(input.capacity).max(1),
        ..SimConfig::default()
    });

    for command in input.commands {
        let before = space.render();
        let result = match command {
            Command::Alloc {
                owner,
                size,
                strategy,
            } => space
                .allocate(&format!("P{}", owner % 16), i64::from(size), &strategy)
                .map(|_| ()),
            Command::Free { owner } => space.deallocate(&format!("P{}", owner % 16)).map(|_| ()),
            Command::Suggest { size } => space.suggest(i64::from(size)).map(|_| ()),
            Command::Reset => {
                space.reset();
                Ok(())
            }
        };

        // Rejected commands must not touch the ledger
        if result.is_err() {
            assert_eq!(space.render(), before);
        }
        assert_eq!(space.ledger().check_invariants(true), Ok(()));
    }
});
