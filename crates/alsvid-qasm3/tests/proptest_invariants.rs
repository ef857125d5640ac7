//! Property-based tests for the quantified front-end invariants:
//! index sanity, the broadcast law, the range law and the gate-equivalence
//! laws for `pow`/`inv` chains.

use alsvid_qasm3::elaborate;
use proptest::prelude::*;

/// Names of single-qubit builtin gates used to generate random programs.
const GATES: [&str; 6] = ["h", "x", "y", "z", "s", "t"];

/// A random program over one register: a list of (gate, target) pairs.
fn arb_program() -> impl Strategy<Value = (u32, String)> {
    (1u32..=6).prop_flat_map(|n| {
        prop::collection::vec((0..GATES.len(), 0..n), 1..24).prop_map(move |ops| {
            let mut source = format!("qubit[{n}] q;\n");
            for (g, target) in ops {
                source.push_str(&format!("{} q[{}];\n", GATES[g], target));
            }
            (n, source)
        })
    })
}

proptest! {
    /// Every emitted target index lies in `[0, qubit_count)`.
    #[test]
    fn index_sanity((n, source) in arb_program()) {
        let circuit = elaborate(&source).unwrap();
        prop_assert_eq!(circuit.qubit_count(), n);
        for inst in circuit.instructions() {
            for q in &inst.targets {
                prop_assert!(q.0 < circuit.qubit_count());
            }
        }
    }

    /// Applying a single-qubit gate to a register of length L produces
    /// exactly L instructions, the i-th targeting element i.
    #[test]
    fn broadcast_law(n in 1u32..=8, g in 0..GATES.len()) {
        let source = format!("qubit[{n}] q; {} q;", GATES[g]);
        let circuit = elaborate(&source).unwrap();
        prop_assert_eq!(circuit.instructions().len(), n as usize);
        for (i, inst) in circuit.instructions().iter().enumerate() {
            prop_assert_eq!(inst.targets[0].0, i as u32);
        }
    }

    /// A for loop over `[lo : step : hi]` unrolls once per element of the
    /// inclusive arithmetic progression.
    #[test]
    fn range_law(lo in 0i64..8, step in 1i64..4, hi in 0i64..16) {
        let source = format!(
            "qubit q; for int[32] i in [{lo}:{step}:{hi}] {{ x q; }}"
        );
        let circuit = elaborate(&source).unwrap();
        let expected = if hi >= lo {
            ((hi - lo) / step + 1) as usize
        } else {
            0
        };
        prop_assert_eq!(circuit.instructions().len(), expected);
    }

    /// pow(a) @ pow(b) @ g ≡ pow(a * b) @ g.
    #[test]
    fn pow_composition_law(a in -4.0f64..4.0, b in -4.0f64..4.0) {
        let source = format!("qubit q; pow({a}) @ pow({b}) @ x q;");
        let circuit = elaborate(&source).unwrap();
        prop_assert_eq!(circuit.instructions().len(), 1);
        let power = circuit.instructions()[0].operator.power();
        prop_assert!((power - a * b).abs() < 1e-9);
    }

    /// inv @ inv @ g ≡ g and pow(1) @ g ≡ g.
    #[test]
    fn inverse_involution_law(g in 0..GATES.len()) {
        let plain = elaborate(&format!("qubit q; {} q;", GATES[g])).unwrap();
        let doubled =
            elaborate(&format!("qubit q; inv @ inv @ {} q;", GATES[g])).unwrap();
        let pow_one =
            elaborate(&format!("qubit q; pow(1) @ {} q;", GATES[g])).unwrap();
        prop_assert_eq!(plain.instructions(), doubled.instructions());
        prop_assert_eq!(plain.instructions(), pow_one.instructions());
    }

    /// Register-size inputs see every element exactly once when indexed by
    /// an open-ended range.
    #[test]
    fn open_range_covers_register(n in 2u32..=8) {
        let source = format!("qubit[{n}] q; x q[0:];");
        let circuit = elaborate(&source).unwrap();
        prop_assert_eq!(circuit.instructions().len(), n as usize);
    }
}
