use resonar_cooked::{DialogueArgumentItem, GroupValueCookedData, RequiredArguments};

use crate::error::{LoaderError, LoaderResult};

/// Argument value meaning "any": the engine falls back to its default path.
pub const FALLBACK_ARGUMENT: u32 = 0;

/// Build the argument vector handed to the engine's dialogue resolution.
///
/// Ordered arguments must match the declared argument count exactly; a
/// missing argument becomes [`FALLBACK_ARGUMENT`]. Unordered arguments are
/// placed by their switch or state group into the first free position
/// declared for that group; unknown groups are ignored with a warning.
pub fn build_argument_values(
    required: &RequiredArguments,
    arguments: &[Option<&GroupValueCookedData>],
    ordered: bool,
) -> LoaderResult<Vec<u32>> {
    let count = required.required_count();

    if ordered {
        if arguments.len() != count {
            return Err(LoaderError::ArgumentCountMismatch {
                expected: count,
                supplied: arguments.len(),
            });
        }
        return Ok(arguments
            .iter()
            .map(|argument| argument.map_or(FALLBACK_ARGUMENT, |value| value.id))
            .collect());
    }

    let mut values = vec![FALLBACK_ARGUMENT; count];
    for argument in arguments.iter().flatten() {
        let item = DialogueArgumentItem::from_group_value(argument);
        let Some(positions) = required.positions_of(&item) else {
            tracing::warn!(
                "Argument {} doesn't have any use in this dialogue event, ignoring",
                argument.debug_string()
            );
            continue;
        };

        let free = positions
            .iter()
            .filter_map(|&position| usize::try_from(position).ok())
            .find(|&position| values.get(position) == Some(&FALLBACK_ARGUMENT));
        match free {
            Some(position) => values[position] = argument.id,
            None => tracing::warn!(
                "No free position for argument {}, ignoring",
                argument.debug_string()
            ),
        }
    }
    Ok(values)
}
