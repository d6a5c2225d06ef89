//! Temporary credentials for newly provisioned accounts.

use uuid::Uuid;

/// One word per random byte.
const WORDS: [&str; 256] = [
    "apple", "potato", "mirror", "river", "candle", "falcon", "harbor", "meadow",
    "pepper", "quartz", "saddle", "timber", "violet", "walnut", "yonder", "zephyr",
    "anchor", "bramble", "cobalt", "dune", "ember", "fjord", "garnet", "hollow",
    "island", "juniper", "kettle", "lantern", "marble", "nectar", "orchid", "pebble",
    "acorn", "badger", "basket", "beacon", "biscuit", "blanket", "blossom", "bonnet",
    "bottle", "breeze", "bridge", "bucket", "button", "cabin", "cactus", "camel",
    "canyon", "carpet", "castle", "cedar", "cellar", "cherry", "chimney", "cinder",
    "clover", "comet", "copper", "coral", "cotton", "cradle", "crater", "cricket",
    "crystal", "cupboard", "dagger", "daisy", "dolphin", "donkey", "dragon", "drummer",
    "eagle", "easel", "eclipse", "elbow", "elder", "engine", "feather", "fender",
    "ferret", "fiddle", "field", "fig", "flannel", "flint", "forest", "fossil",
    "fountain", "fox", "galaxy", "garden", "gazelle", "geyser", "ginger", "glacier",
    "goblet", "gopher", "granite", "gravel", "grove", "guitar", "gull", "hammer",
    "hazel", "heron", "hickory", "honey", "horizon", "hornet", "iceberg", "igloo",
    "ink", "iris", "ivory", "jacket", "jaguar", "jasmine", "jelly", "jewel",
    "jigsaw", "jungle", "kayak", "kernel", "kestrel", "kitten", "koala", "ladder",
    "lagoon", "lake", "lemon", "lentil", "lilac", "linen", "lizard", "lobster",
    "locket", "lotus", "lumber", "magnet", "mango", "maple", "meteor", "mitten",
    "monkey", "moose", "mosaic", "muffin", "mustard", "needle", "nickel", "nutmeg",
    "oak", "oasis", "ocean", "olive", "onion", "opal", "orbit", "otter",
    "oyster", "paddle", "palace", "panda", "panther", "parrot", "peach", "pelican",
    "pencil", "piano", "pickle", "pigeon", "pillow", "pine", "pirate", "planet",
    "plum", "pocket", "pony", "poppy", "prairie", "pretzel", "puffin", "pumpkin",
    "quail", "quill", "rabbit", "radish", "raven", "reef", "ribbon", "robin",
    "rocket", "rooster", "ruby", "saffron", "salmon", "sapphire", "scarf", "seashell",
    "shadow", "sheep", "shovel", "silver", "skipper", "sparrow", "spider", "spruce",
    "squash", "squirrel", "stable", "starfish", "stone", "stream", "sugar", "summit",
    "sunset", "swan", "tablet", "tangerine", "teapot", "thistle", "thunder", "tiger",
    "toast", "tomato", "topaz", "tortoise", "tractor", "trellis", "trumpet", "tulip",
    "tundra", "turnip", "turtle", "umbrella", "valley", "velvet", "village", "vine",
    "waffle", "wagon", "walrus", "wander", "whale", "wheat", "whistle", "willow",
    "window", "winter", "wizard", "wombat", "yarrow", "yogurt", "zebra", "zinnia",
];

/// 6 words of 8 bits each: 48 bits of entropy.
const WORDS_PER_PASSWORD: usize = 6;

/// Generates a hyphen-joined passphrase such as
/// `apple-potato-mirror-river-candle-falcon`.
///
/// Users are expected to replace it on first sign-in.
pub fn generate_temporary_password() -> String {
    let entropy = Uuid::new_v4();
    entropy
        .as_bytes()
        .iter()
        .enumerate()
        // Bytes 6 and 8 carry the UUID version and variant bits.
        .filter(|(index, _)| *index != 6 && *index != 8)
        .take(WORDS_PER_PASSWORD)
        .map(|(_, byte)| WORDS[usize::from(*byte)])
        .collect::<Vec<_>>()
        .join("-")
}
