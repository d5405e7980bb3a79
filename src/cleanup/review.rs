//! Manual-review templates for pairs that are not annotated automatically.

use std::fmt::Write;

use crate::core::ComparableUnit;
use crate::similarity::SimilarityResult;

/// A backtick fence longer than any backtick run in `body`, so the block
/// cannot be closed early.
fn fence_for(body: &str) -> String {
    let longest = body
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat((longest + 1).max(3))
}

fn write_unit(out: &mut String, heading: &str, unit: &ComparableUnit) -> std::fmt::Result {
    writeln!(out, "### {heading}: `{}`", unit.name)?;
    writeln!(out)?;
    writeln!(out, "- Location: `{}`", unit.location())?;
    writeln!(out, "- Language: {}", unit.language)?;
    writeln!(out, "- Fingerprint: `{}`", unit.fingerprint)?;
    writeln!(out)?;
    let info = if unit.language.is_documentation() { "text".to_string() } else { unit.language.to_string() };
    let fence = fence_for(&unit.body);
    writeln!(out, "{fence}{info}")?;
    writeln!(out, "{}", unit.body.trim_end())?;
    writeln!(out, "{fence}")?;
    writeln!(out)?;
    Ok(())
}

fn write_template(out: &mut String, pair: &SimilarityResult, index: usize) -> std::fmt::Result {
    let a = &pair.unit_a;
    let b = &pair.unit_b;

    writeln!(out, "# Redundancy Review #{index}")?;
    writeln!(out)?;
    writeln!(
        out,
        "`{}` and `{}` are {:.1}% similar ({} comparison).",
        a.location(),
        b.location(),
        pair.combined_score,
        a.kind
    )?;
    if pair.is_exact_duplicate() {
        writeln!(out)?;
        writeln!(out, "The bodies are identical after whitespace normalisation.")?;
    }
    writeln!(out)?;

    writeln!(out, "## Similarity breakdown")?;
    writeln!(out)?;
    writeln!(out, "| Component | Score |")?;
    writeln!(out, "|-----------|-------|")?;
    writeln!(out, "| Lexical | {:.1} |", pair.lexical_score)?;
    writeln!(out, "| Structural | {:.1} |", pair.structural_score)?;
    writeln!(out, "| Semantic | {:.1} |", pair.semantic_score)?;
    writeln!(out, "| **Combined** | **{:.1}** |", pair.combined_score)?;
    writeln!(out)?;

    writeln!(out, "## Units")?;
    writeln!(out)?;
    write_unit(out, "First", a)?;
    write_unit(out, "Second", b)?;

    writeln!(out, "## Consolidation strategies")?;
    writeln!(out)?;
    writeln!(
        out,
        "1. **Extract a shared helper.** Move the common logic into one unit and call it from both `{}` and `{}`.",
        a.name, b.name
    )?;
    writeln!(
        out,
        "2. **Keep one and delegate.** Keep `{}` and make `{}` forward to it, or remove `{}` and update its callers.",
        a.name, b.name, b.name
    )?;
    writeln!(
        out,
        "3. **Document the divergence.** If both must stay, record why next to each unit so the duplication is intentional."
    )?;
    writeln!(out)?;

    writeln!(out, "## Checklist")?;
    writeln!(out)?;
    writeln!(out, "- [ ] Confirm both units implement the same behaviour")?;
    writeln!(out, "- [ ] Check callers and references of both units")?;
    writeln!(out, "- [ ] Choose a strategy and apply it")?;
    writeln!(out, "- [ ] Run the test suite")?;
    writeln!(out, "- [ ] Remove any repowarden annotation left on the units")?;
    Ok(())
}

/// Render the Markdown review document for one redundant pair.
pub fn render_review(pair: &SimilarityResult, index: usize) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_template(&mut out, pair, index);
    out
}
