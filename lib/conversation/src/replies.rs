//! Canned reply templates.

/// Reply for a catch that is fine to keep.
pub const GOOD_FISH: &str = "Congrats! You got $fishName in $locationName.
On average they grow to $fishLength meters long and weigh $fishWeight kg.
Yum! This fish is recommended for health for the following reasons: 1, 3, 5

:: I wanna upload another pic of fish!
:: Tell me more about the reasons";

/// Reply for a protected species.
pub const ENDANGERED_FISH: &str = "Jackpot! You caught a $fishName. This is a rare breed and hard to find.
Not edible and it's illegal to keep.
We suggest you contact the following organizations below.
Might get potential rewards! $contactAgency";

/// Sent while a photo is being identified.
pub const WAIT_FOR_IDENTIFICATION: &str =
    "Received your image. Please wait a second until we identify your catch.";
