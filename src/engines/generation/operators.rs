use crate::engines::generation::individual::Individual;
use rand::seq::index::sample;
use rand::Rng;

/// Characters used to fill seeds that have no text of their own
pub const POPULATION_ALPHABET: &[u8] = b" abcdefghijklmnopqrstuvwxyz";

// Bounded reselection before the second parent is drawn uniformly from the rest
const MAX_PARENT_RESELECTIONS: usize = 32;

/// Random visible ASCII character (0x20..=0x7E)
pub fn random_printable<R: Rng + ?Sized>(rng: &mut R) -> char {
    rng.gen_range(0x20u8..=0x7e) as char
}

/// Tournament selection: best of `tournament_size` distinct random candidates.
///
/// Returns the winner's index. Equal fitness goes to the lower index, which
/// in a best-first population is the individual ranked higher.
pub fn tournament_selection<R: Rng + ?Sized>(
    population: &[Individual],
    tournament_size: usize,
    rng: &mut R,
) -> usize {
    let amount = tournament_size.clamp(1, population.len());
    let mut best_idx = usize::MAX;

    for idx in sample(rng, population.len(), amount).iter() {
        if best_idx == usize::MAX
            || population[idx].fitness() > population[best_idx].fitness()
            || (population[idx].fitness() == population[best_idx].fitness() && idx < best_idx)
        {
            best_idx = idx;
        }
    }

    best_idx
}

/// Two distinct parents, each chosen by tournament. Requires at least two individuals.
pub fn select_parents<R: Rng + ?Sized>(
    population: &[Individual],
    tournament_size: usize,
    rng: &mut R,
) -> (usize, usize) {
    let first = tournament_selection(population, tournament_size, rng);

    for _ in 0..MAX_PARENT_RESELECTIONS {
        let second = tournament_selection(population, tournament_size, rng);
        if second != first {
            return (first, second);
        }
    }

    let mut second = rng.gen_range(0..population.len() - 1);
    if second >= first {
        second += 1;
    }
    (first, second)
}

/// Per-character mutation: each character, with probability `rate`, is
/// substituted, deleted, or preceded by an inserted character.
///
/// Never returns an empty string.
pub fn mutate<R: Rng + ?Sized>(text: &str, rate: f64, rng: &mut R) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return random_printable(rng).to_string();
    }

    let mut out = String::with_capacity(text.len() + 4);
    let last = chars.len() - 1;

    for (i, &ch) in chars.iter().enumerate() {
        if !rng.gen_bool(rate) {
            out.push(ch);
            continue;
        }
        match rng.gen_range(0..3) {
            0 => out.push(random_printable(rng)),
            1 => {
                // deleting the only character left would empty the string
                if out.is_empty() && i == last {
                    out.push(ch);
                }
            }
            _ => {
                out.push(random_printable(rng));
                out.push(ch);
            }
        }
    }

    out
}

/// Exactly one edit at a random position; the result always differs from `text`.
pub fn point_mutation<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return random_printable(rng).to_string();
    }

    let pos = rng.gen_range(0..chars.len());
    let mut op = rng.gen_range(0..3);
    if op == 1 && chars.len() == 1 {
        op = 0;
    }

    match op {
        0 => {
            let original = chars[pos];
            let mut replacement = random_printable(rng);
            while replacement == original {
                replacement = random_printable(rng);
            }
            chars[pos] = replacement;
        }
        1 => {
            chars.remove(pos);
        }
        _ => chars.insert(pos, random_printable(rng)),
    }

    chars.into_iter().collect()
}

/// Fit a seed to `length` characters.
///
/// Longer seeds are truncated; shorter ones are repeated, separated by single
/// spaces, then truncated. An empty seed stays empty.
pub fn fit_to_length(seed: &str, length: usize) -> String {
    if seed.is_empty() {
        return String::new();
    }

    let mut fitted = seed.to_string();
    while fitted.chars().count() < length {
        fitted.push(' ');
        fitted.push_str(seed);
    }
    fitted.chars().take(length).collect()
}

pub fn random_text<R: Rng + ?Sized>(length: usize, rng: &mut R) -> String {
    (0..length.max(1))
        .map(|_| POPULATION_ALPHABET[rng.gen_range(0..POPULATION_ALPHABET.len())] as char)
        .collect()
}

/// Initial-population variation of one target string.
///
/// The seed is fitted to `output_length`, then run through 1 to 3 mutation
/// passes at `char_rate`. If no pass changed anything, a single point
/// mutation is forced so every individual differs from its seed.
pub fn seed_variation<R: Rng + ?Sized>(
    seed: &str,
    output_length: usize,
    char_rate: f64,
    rng: &mut R,
) -> String {
    let base = fit_to_length(seed, output_length);
    if base.is_empty() {
        return random_text(output_length, rng);
    }

    let passes = rng.gen_range(1..=3);
    let mut text = base.clone();
    for _ in 0..passes {
        text = mutate(&text, char_rate, rng);
    }

    if text == base {
        text = point_mutation(&text, rng);
    }
    text
}
