use crossfill::{
    find_fill, Assignment, ConstraintGraph, FillFailure, FillOptions, Grid, Solver, WordList,
};

fn grid_from_template(template: &str) -> Grid {
    Grid::new(
        template
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().map(|c| c != '#').collect::<Vec<bool>>())
            .collect(),
    )
}

/// Every slot is filled with a word of the right length, and every crossing agrees.
fn assert_valid_fill(grid: &Grid, words: &WordList, assignment: &Assignment) {
    let graph = ConstraintGraph::new(grid);
    assert_eq!(assignment.len(), grid.slot_count());

    for (slot_id, slot) in grid.slots().iter().enumerate() {
        let word = assignment.word_for(slot_id, words).expect("slot left empty");
        assert_eq!(word.chars().count(), slot.length);

        for &neighbor in graph.neighbors(slot_id) {
            let (i, j) = graph.overlaps(slot_id, neighbor).unwrap();
            let other = assignment.word_for(neighbor, words).unwrap();
            assert_eq!(word.chars().nth(i), other.chars().nth(j));
        }
    }

    // Reading the letter grid back gives the same words.
    let letters = assignment.letter_grid(grid, words);
    for (slot_id, slot) in grid.slots().iter().enumerate() {
        let read: String = slot.cells().map(|(row, col)| letters[row][col].unwrap()).collect();
        assert_eq!(Some(read.as_str()), assignment.word_for(slot_id, words));
    }
}

fn both_modes() -> [FillOptions; 2] {
    [
        FillOptions::default(),
        FillOptions { maintain_arc_consistency: true, ..FillOptions::default() },
    ]
}

/// #.#
/// ...
/// #.#
fn cross() -> Grid {
    grid_from_template(
        "
        #.#
        ...
        #.#
        ",
    )
}

#[test]
fn test_two_crossing_slots_agree() {
    let grid = cross();
    let words = WordList::new(["cat", "dog", "car"]);

    for options in both_modes() {
        let result = find_fill(&grid, &words, &options).expect("Failed to find a fill");

        assert_valid_fill(&grid, &words, &result.assignment);
        println!("{:?}", result.statistics);
    }
}

#[test]
fn test_crossing_with_no_agreeing_pair_fails() {
    // Across at (1, 0), down at (0, 2): the across word's last letter is the down word's middle.
    let grid = grid_from_template(
        "
        ##.
        ...
        ##.
        ",
    );
    let words = WordList::new(["cat", "dog"]);
    let mut solver = Solver::new(&grid, &words, FillOptions::default());

    let failure = solver.solve().expect_err("Found an impossible fill??");

    assert!(matches!(failure, FillFailure::PropagationFailure { .. }));
    assert_eq!(solver.statistics().states, 0);
}

#[test]
fn test_search_exhaustion_is_reported_separately() {
    // Arc consistency can't see the duplicate rule, so only search proves this impossible.
    let grid = cross();
    let words = WordList::new(["cat", "dog"]);
    let options = FillOptions { unique_words: true, ..FillOptions::default() };
    let mut solver = Solver::new(&grid, &words, options);

    assert_eq!(solver.solve().unwrap_err(), FillFailure::SearchExhausted);
    assert!(solver.statistics().states > 0);
}

#[test]
fn test_single_isolated_slot() {
    let grid = Grid::new(vec![vec![true; 4]]);
    let words = WordList::new(["wind"]);

    let result = find_fill(&grid, &words, &FillOptions::default()).expect("Failed to find a fill");

    assert_eq!(result.assignment.len(), 1);
    assert_eq!(result.assignment.word_for(0, &words), Some("wind"));
}

#[test]
fn test_no_words_of_slot_length_skips_search() {
    let grid = Grid::new(vec![vec![true; 5]]);
    let words = WordList::new(["wind", "seas", "dogs"]);
    let mut solver = Solver::new(&grid, &words, FillOptions::default());

    assert_eq!(solver.solve().unwrap_err(), FillFailure::PropagationFailure { slot_id: 0 });
    assert_eq!(solver.statistics().states, 0);
    assert!(solver.domains().is_empty(0));
}

#[test]
fn test_empty_grid_is_trivially_filled() {
    for grid in [Grid::new(vec![]), Grid::new(vec![vec![false; 3]; 3])] {
        let words = WordList::new(["cat"]);
        let mut solver = Solver::new(&grid, &words, FillOptions::default());

        let result = solver.solve().expect("Failed to find a fill");

        assert!(result.assignment.is_empty());
        assert_eq!(result.statistics.states, 0);
    }
}

/// ...
/// ...
/// ...
#[test]
fn test_find_fill_for_3x3_square() {
    let grid = grid_from_template(
        "
        ...
        ...
        ...
        ",
    );
    let words = WordList::new(["dog", "cat", "bat", "ale", "ten", "tea", "eat", "zoo"]);

    for options in both_modes() {
        let result = find_fill(&grid, &words, &options).expect("Failed to find a fill");

        assert_valid_fill(&grid, &words, &result.assignment);
        println!("{:?}", result.statistics);
    }
}

/// ....
/// .#..
/// ....
/// ..#.
#[test]
fn test_find_fill_with_blocks() {
    let grid = grid_from_template(
        "
        ....
        .#..
        ....
        ..#.
        ",
    );
    // One fill: rows "area", "n#to", "toad", "en#a", so columns "ante", "r#on", "eta#", "aoda".
    let words = WordList::new([
        "area", "to", "toad", "en", "ante", "on", "eta", "aoda", "zz", "qqqq",
    ]);

    for options in both_modes() {
        let result = find_fill(&grid, &words, &options).expect("Failed to find a fill");

        assert_valid_fill(&grid, &words, &result.assignment);
    }
}

#[test]
fn test_fill_is_deterministic() {
    let grid = cross();
    let words = WordList::new(["cat", "dog", "car", "cap", "oak"]);

    let first = find_fill(&grid, &words, &FillOptions::default()).unwrap();
    let second = find_fill(&grid, &words, &FillOptions::default()).unwrap();

    assert_eq!(first.assignment, second.assignment);
}
