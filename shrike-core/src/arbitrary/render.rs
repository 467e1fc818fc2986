//! Envelope rendering for debugging shrink structure.

use super::Arbitrary;
use crate::report::encode;

impl Arbitrary {
    /// Render the envelope tree: elements first, then precursors (marked `<-`).
    pub fn render(&self) -> String {
        let mut result = String::new();
        self.render_recursive(&mut result, "", true, "");
        result
    }

    fn render_recursive(&self, result: &mut String, prefix: &str, is_last: bool, marker: &str) {
        result.push_str(prefix);
        result.push_str(if is_last { "└── " } else { "├── " });
        result.push_str(marker);
        result.push_str(&encode(self.value()));
        if let Some(shrinker) = self.shrinker() {
            result.push_str(&format!("  [{}]", shrinker.name()));
        }
        result.push('\n');

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        let children: Vec<(&Arbitrary, &str)> = self
            .elements()
            .iter()
            .map(|e| (e, ""))
            .chain(self.precursors().iter().map(|p| (p, "<- ")))
            .collect();
        for (i, (child, marker)) in children.iter().enumerate() {
            child.render_recursive(result, &child_prefix, i == children.len() - 1, marker);
        }
    }

    /// Render the value with its element structure on one line.
    pub fn render_compact(&self) -> String {
        if self.elements().is_empty() {
            encode(self.value())
        } else {
            let parts: Vec<String> = self.elements().iter().map(|e| e.render_compact()).collect();
            format!("{}[{}]", self.type_of(), parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::arbitrary::Arbitrary;
    use crate::constraints::{LengthRange, Range};
    use crate::convert::IntoValue;
    use crate::data::{Bias, RandomSource};
    use crate::gen;
    use crate::types::Type;
    use crate::value::Value;

    #[test]
    fn renders_elements_and_precursors() {
        let source = Arbitrary::new(Value::U64(4));
        let derived = Arbitrary::derived(Value::U8(4), vec![source]);
        let pair = Arbitrary::assemble(
            &(0u8, 0u64).into_value(),
            vec![derived, Arbitrary::new(Value::U64(9))],
        )
        .unwrap();

        let rendered = pair.render();
        assert_eq!(
            rendered,
            "└── (4, 9)\n    ├── 4\n    │   └── <- 4\n    └── 9\n"
        );
        assert_eq!(pair.render_compact(), "(u8, u64)[4, 9]");
    }

    #[test]
    fn snapshot_generated_envelopes() {
        let generator = gen::slice(
            gen::unsigned(Range::new(0u16, 50).unwrap()),
            LengthRange::new(1, 4).unwrap(),
        );
        let target = Type::slice(Type::U16);
        let arb = generator
            .generate(&target, Bias::full(), &mut RandomSource::from_u64(42))
            .unwrap();

        archetype::snap("slice_envelope_render", arb.render());
        archetype::snap("slice_envelope_render_compact", arb.render_compact());
    }
}
