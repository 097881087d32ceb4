//! Final selection: accepted ∪ conditionally accepted, without redundancy.

use crate::backend::Backend;
use crate::error::InductionError;
use crate::outcome::Provenance;
use crate::scored::Scored;

/// A surviving predicate and the set it came from.
#[derive(Debug, Clone)]
pub struct Selected {
    pub entry: Scored,
    pub provenance: Provenance,
}

/// Resolve containment between the accepted and conditionally accepted
/// sets.
///
/// For every accepted/conditional pair related by containment (either
/// direction) the lower-scoring member is removed; on a tie the
/// conditional one goes. Conditional members that survive that pass are
/// then resolved against each other the same way, the later one losing a
/// tie. The output is an antichain, so running the selector again on its
/// own output removes nothing.
///
/// Accepted predicates are assumed pairwise unrelated, which the search
/// driver guarantees on admission.
pub fn select_final(
    accepted: &[Scored],
    conditional: &[Scored],
    backend: &dyn Backend,
) -> Result<Vec<Selected>, InductionError> {
    let mut accepted: Vec<&Scored> = accepted.iter().collect();
    let mut conditional: Vec<&Scored> = conditional.iter().collect();
    accepted.sort_by(|a, b| Scored::rank(a, b));
    conditional.sort_by(|a, b| Scored::rank(a, b));

    let mut drop_accepted = vec![false; accepted.len()];
    let mut drop_conditional = vec![false; conditional.len()];

    for (i, a) in accepted.iter().enumerate() {
        for (j, c) in conditional.iter().enumerate() {
            if !related(a, c, backend)? {
                continue;
            }
            if a.score >= c.score {
                drop_conditional[j] = true;
            } else {
                drop_accepted[i] = true;
            }
        }
    }

    // `conditional` is rank-sorted, so the later member of a pair is never
    // the higher-scoring one. Only survivors can displace.
    for i in 0..conditional.len() {
        if drop_conditional[i] {
            continue;
        }
        for j in (i + 1)..conditional.len() {
            if !drop_conditional[j] && related(conditional[i], conditional[j], backend)? {
                drop_conditional[j] = true;
            }
        }
    }

    let mut selected: Vec<Selected> = accepted
        .into_iter()
        .zip(drop_accepted)
        .filter(|(_, dropped)| !dropped)
        .map(|(entry, _)| Selected {
            entry: entry.clone(),
            provenance: Provenance::Accepted,
        })
        .chain(
            conditional
                .into_iter()
                .zip(drop_conditional)
                .filter(|(_, dropped)| !dropped)
                .map(|(entry, _)| Selected {
                    entry: entry.clone(),
                    provenance: Provenance::ConditionallyAccepted,
                }),
        )
        .collect();
    selected.sort_by(|a, b| Scored::rank(&a.entry, &b.entry));
    Ok(selected)
}

fn related(a: &Scored, b: &Scored, backend: &dyn Backend) -> Result<bool, InductionError> {
    Ok(a.predicate.contains(&b.predicate, backend)?
        || b.predicate.contains(&a.predicate, backend)?)
}
