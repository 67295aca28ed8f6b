//! Type weakness derivation.

use std::collections::BTreeSet;

use crate::pokeapi::api_types::ApiDamageRelations;

/// Compute the weaknesses of a pokemon from the damage relations of its types.
///
/// A type is a weakness when any relation takes double damage from it and no
/// relation takes half or no damage from it. Relations missing because their
/// fetch failed are simply not passed in.
///
/// The result is sorted, so it does not depend on the order of `relations`.
pub fn derive_weaknesses<'a, I>(relations: I) -> Vec<String>
where
  I: IntoIterator<Item = &'a ApiDamageRelations>,
{
  let mut potential = BTreeSet::new();
  let mut neutralized = BTreeSet::new();

  for relation in relations {
    potential.extend(relation.double_damage_from.iter().map(|t| t.name.as_str()));
    neutralized.extend(
      relation
        .half_damage_from
        .iter()
        .chain(&relation.no_damage_from)
        .map(|t| t.name.as_str()),
    );
  }

  potential
    .difference(&neutralized)
    .map(|name| name.to_string())
    .collect()
}
