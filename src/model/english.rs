use crate::model::Model;
use crate::trainer::{self, TrainOptions};

/// Training corpus of the bundled default model: plain English prose and
/// a list of the most frequent English words, one segment per line.
const ENGLISH_CORPUS: &str = "\
the quick brown fox jumps over the lazy dog while the old man watches them both\n\
she said that the weather would turn before the end of the week and it did\n\
there is nothing better than the first light of the morning on the water\n\
he thought that they would rather wait for the train than walk all the way home\n\
when the children came back from the river they told us what they had seen there\n\
it is often the case that the simplest answer turns out to be the right one\n\
the people of the town gathered in the square to hear what the mayor had to say\n\
after the storm the air was clear and the whole valley could be seen from the hill\n\
this is the sort of thing that happens when nobody takes the time to check\n\
most of them were still there at the end, and some of them stayed another day\n\
a little more than half of the students finished the test before the bell rang\n\
in the middle of the night the wind shifted and the rain started coming down\n\
they have been working on the same problem for years without losing heart\n\
the story begins in a small house at the edge of a great dark forest\n\
everything that could go wrong went wrong, and still they kept their heads\n\
nothing much happened until the third day, when the letters started to arrive\n\
the answer, as it turned out, had been sitting on the table the whole time\n\
what matters in the end is not how often you fall but how often you stand up\n\
the first thing she noticed was the smell of bread coming from the kitchen\n\
with a little patience and the right tools the work went faster than expected\n\
the that and this with they have from were been their which them would there\n\
what when your said each about other into more some could these than then\n\
time will just know people year take good come over think also back after\n\
work first well even want because any give most water little through where\n\
should still such being under never while might those both between against\n\
during another again further once here why how all any both each few more\n\
other some only own same so than too very just don't should now it's that's\n\
the and for are but not you all can her was one our out day get has him his\n\
see two way who boy did its let put say she too use father mother brother\n\
house water sound place right think great where world school never started\n\
";

/// The bundled English-text model, trained deterministically from the
/// embedded corpus with the default options.
pub fn english_model() -> Model {
    trainer::train(ENGLISH_CORPUS.as_bytes(), &TrainOptions::default())
        .expect("the bundled corpus must produce a valid model")
}
